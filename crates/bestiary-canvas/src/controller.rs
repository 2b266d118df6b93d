//! Interaction controller.
//!
//! Owns the live node/edge state handed to the rendering surface and mediates
//! every gesture: opening/saving the specificity editor, connect drags from an
//! attribute handle to a specificity node, and node drag-release. Mutations
//! are applied to the local caches and the projection is re-run; each mutation
//! carries a deliberate cache policy:
//!
//! | mutation            | policy      |
//! |---------------------|-------------|
//! | create specificity  | patch-by-id |
//! | update text         | patch-by-id |
//! | update position     | patch-by-id |
//! | add connection      | refetch-all |
//! | remove connection   | refetch-all |
//!
//! Connection mutations refetch because join-row ids are server-assigned and
//! the projection keys edges on them.
//!
//! Position writes are write-behind with acknowledgment: the drag is applied
//! optimistically, then awaited; on failure the local position reverts to the
//! pre-drag value, so client and server never drift silently.

use tracing::{debug, warn};
use uuid::Uuid;

use bestiary_model::{Entity, GameClass, Position, Specificity};

use crate::backend::{BackendError, EntityBackend, SpecificityBackend};
use crate::model::{parse_spec_node_id, CanvasGraph};
use crate::projection::project;

/// State of the single specificity-editor dialog.
///
/// `Closed → Creating|Editing → (success) Closed | (failure) unchanged`.
/// Opening a new dialog discards any unsaved state without confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    Closed,
    Creating { entity_id: Uuid, attribute_id: Uuid, text: String },
    Editing { specificity_id: Uuid, text: String },
}

/// Result of a connect gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Target was not a specificity node; no request was sent.
    Rejected,
    /// Connection persisted and the collection refetched.
    Connected,
}

/// Result of a drag-release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Node id matched neither an entity nor a specificity.
    Ignored,
    /// New position acknowledged by the store.
    Persisted,
    /// Write failed; the local position was reverted to the pre-drag value.
    Reverted,
}

/// Owns the derived graph and the specificity cache; applies gestures and
/// reconciles persistence results.
pub struct CanvasController<B> {
    backend: B,
    entities: Vec<Entity>,
    classes: Vec<GameClass>,
    specificities: Vec<Specificity>,
    graph: CanvasGraph,
    editor: EditorState,
}

impl<B> CanvasController<B>
where
    B: SpecificityBackend + EntityBackend,
{
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            entities: Vec::new(),
            classes: Vec::new(),
            specificities: Vec::new(),
            graph: CanvasGraph::default(),
            editor: EditorState::Closed,
        }
    }

    /// Initial load: entities/classes arrive from the parent collections, the
    /// specificity collection is fetched once, then the graph is projected.
    pub async fn load(
        &mut self,
        entities: Vec<Entity>,
        classes: Vec<GameClass>,
    ) -> Result<(), BackendError> {
        self.entities = entities;
        self.classes = classes;
        self.specificities = self.backend.list_specificities().await?;
        self.reproject();
        Ok(())
    }

    /// Re-synchronizes the entity/class snapshots after the external CRUD
    /// layer mutated them, and re-runs the projection.
    pub fn sync_collections(&mut self, entities: Vec<Entity>, classes: Vec<GameClass>) {
        self.entities = entities;
        self.classes = classes;
        self.reproject();
    }

    /// The current derived graph.
    pub fn graph(&self) -> &CanvasGraph {
        &self.graph
    }

    /// The current editor dialog state.
    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    /// The cached specificity collection.
    pub fn specificities(&self) -> &[Specificity] {
        &self.specificities
    }

    // ── Editor dialog ─────────────────────────────────────────────────────

    /// Opens the editor for an (entity, attribute) pair. If a specificity
    /// already connects that exact pair the dialog opens pre-filled in
    /// editing mode, otherwise empty in creating mode. Any unsaved previous
    /// dialog state is discarded.
    pub fn open_editor(&mut self, entity_id: Uuid, attribute_id: Uuid) {
        self.editor = match self
            .specificities
            .iter()
            .find(|s| s.connects(entity_id, attribute_id))
        {
            Some(existing) => EditorState::Editing {
                specificity_id: existing.id,
                text: existing.text.clone(),
            },
            None => EditorState::Creating {
                entity_id,
                attribute_id,
                text: String::new(),
            },
        };
    }

    /// Replaces the dialog's text buffer. No-op while closed.
    pub fn set_editor_text(&mut self, text: impl Into<String>) {
        match &mut self.editor {
            EditorState::Creating { text: buffer, .. }
            | EditorState::Editing { text: buffer, .. } => *buffer = text.into(),
            EditorState::Closed => {}
        }
    }

    /// Closes the dialog, discarding unsaved input.
    pub fn close_editor(&mut self) {
        self.editor = EditorState::Closed;
    }

    /// Persists the dialog. Creating issues a creation carrying the one
    /// (entity, attribute) pair; editing issues a text-only patch. The dialog
    /// closes only on confirmed success — on failure it stays open with the
    /// input intact.
    pub async fn save_editor(&mut self) -> Result<(), BackendError> {
        match self.editor.clone() {
            EditorState::Closed => Ok(()),
            EditorState::Creating { entity_id, attribute_id, text } => {
                let created = self
                    .backend
                    .create_specificity(&text, entity_id, attribute_id)
                    .await?;
                debug!(id = %created.id, "specificity created from editor");
                self.specificities.push(created);
                self.editor = EditorState::Closed;
                self.reproject();
                Ok(())
            }
            EditorState::Editing { specificity_id, text } => {
                let updated = self
                    .backend
                    .update_specificity_text(specificity_id, &text)
                    .await?;
                self.merge_specificity(updated);
                self.editor = EditorState::Closed;
                self.reproject();
                Ok(())
            }
        }
    }

    // ── Connect gesture ───────────────────────────────────────────────────

    /// Handles a link drag from an entity's attribute handle onto another
    /// node. `source` is the entity node id, `source_handle` the attribute id
    /// and `target` the node the user dropped on. Targets that are not
    /// specificity nodes are rejected locally — no request is sent. On
    /// success the whole collection is refetched so edges carry the
    /// server-assigned join-row id.
    pub async fn connect(
        &mut self,
        source: &str,
        source_handle: &str,
        target: &str,
    ) -> Result<ConnectOutcome, BackendError> {
        let Some(specificity_id) = parse_spec_node_id(target) else {
            debug!(%target, "connect rejected: target is not a specificity node");
            return Ok(ConnectOutcome::Rejected);
        };
        let (Ok(entity_id), Ok(attribute_id)) =
            (Uuid::parse_str(source), Uuid::parse_str(source_handle))
        else {
            debug!(%source, %source_handle, "connect rejected: unparseable source");
            return Ok(ConnectOutcome::Rejected);
        };

        self.backend
            .add_connection(specificity_id, entity_id, attribute_id)
            .await?;
        self.refetch_specificities().await?;
        Ok(ConnectOutcome::Connected)
    }

    /// Removes a connection, then refetches (same policy as adding).
    pub async fn disconnect(
        &mut self,
        specificity_id: Uuid,
        connection_id: Uuid,
    ) -> Result<(), BackendError> {
        self.backend
            .remove_connection(specificity_id, connection_id)
            .await?;
        self.refetch_specificities().await
    }

    // ── Drag-release ──────────────────────────────────────────────────────

    /// Persists a node's position after a drag. The new position is applied
    /// optimistically and the write awaited; on failure the pre-drag position
    /// is restored and the failure logged.
    pub async fn drag_release(&mut self, node_id: &str, position: Position) -> DragOutcome {
        if let Some(specificity_id) = parse_spec_node_id(node_id) {
            return self.drag_specificity(specificity_id, position).await;
        }
        let Ok(entity_id) = Uuid::parse_str(node_id) else {
            return DragOutcome::Ignored;
        };
        if self.entities.iter().any(|e| e.id == entity_id) {
            return self.drag_entity(entity_id, position).await;
        }
        DragOutcome::Ignored
    }

    async fn drag_entity(&mut self, entity_id: Uuid, position: Position) -> DragOutcome {
        let Some(index) = self.entities.iter().position(|e| e.id == entity_id) else {
            return DragOutcome::Ignored;
        };
        let previous = self.entities[index].position;
        self.entities[index].position = Some(position);
        self.reproject();

        match self.backend.update_entity_position(entity_id, position).await {
            Ok(_) => DragOutcome::Persisted,
            Err(e) => {
                warn!(%entity_id, error = %e, "entity position write failed, reverting");
                self.entities[index].position = previous;
                self.reproject();
                DragOutcome::Reverted
            }
        }
    }

    async fn drag_specificity(
        &mut self,
        specificity_id: Uuid,
        position: Position,
    ) -> DragOutcome {
        let Some(index) = self
            .specificities
            .iter()
            .position(|s| s.id == specificity_id)
        else {
            return DragOutcome::Ignored;
        };
        let previous = self.specificities[index].position;
        self.specificities[index].position = Some(position);
        self.reproject();

        match self
            .backend
            .update_specificity_position(specificity_id, position)
            .await
        {
            Ok(updated) => {
                self.merge_specificity(updated);
                self.reproject();
                DragOutcome::Persisted
            }
            Err(e) => {
                warn!(%specificity_id, error = %e, "specificity position write failed, reverting");
                self.specificities[index].position = previous;
                self.reproject();
                DragOutcome::Reverted
            }
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn reproject(&mut self) {
        self.graph = project(&self.entities, &self.classes, &self.specificities);
    }

    /// patch-by-id: replace the cached record with the server's copy.
    fn merge_specificity(&mut self, updated: Specificity) {
        match self.specificities.iter().position(|s| s.id == updated.id) {
            Some(index) => self.specificities[index] = updated,
            None => self.specificities.push(updated),
        }
    }

    /// refetch-all: replace the whole cache with the server's collection.
    async fn refetch_specificities(&mut self) -> Result<(), BackendError> {
        self.specificities = self.backend.list_specificities().await?;
        self.reproject();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use bestiary_model::{Attribute, AttributeConnection};

    use super::*;
    use crate::model::{spec_node_id, NodeKind};

    /// In-memory stand-in for the HTTP backend. `fail_writes` makes every
    /// mutation return an API error; `requests` counts mutation requests so
    /// tests can assert that local rejections send nothing.
    #[derive(Default)]
    struct FakeBackend {
        specs: Mutex<Vec<Specificity>>,
        fail_writes: AtomicBool,
        requests: AtomicUsize,
    }

    impl FakeBackend {
        fn check(&self) -> Result<(), BackendError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(BackendError::Api { status: 500, message: "injected".into() })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SpecificityBackend for FakeBackend {
        async fn list_specificities(&self) -> Result<Vec<Specificity>, BackendError> {
            Ok(self.specs.lock().unwrap().clone())
        }

        async fn create_specificity(
            &self,
            text: &str,
            entity_id: Uuid,
            attribute_id: Uuid,
        ) -> Result<Specificity, BackendError> {
            self.check()?;
            let id = Uuid::new_v4();
            let spec = Specificity {
                id,
                text: text.into(),
                position: None,
                attribute_connections: vec![AttributeConnection {
                    id: Uuid::new_v4(),
                    specificity_id: id,
                    entity_id,
                    attribute_id,
                }],
            };
            self.specs.lock().unwrap().push(spec.clone());
            Ok(spec)
        }

        async fn update_specificity_text(
            &self,
            id: Uuid,
            text: &str,
        ) -> Result<Specificity, BackendError> {
            self.check()?;
            let mut specs = self.specs.lock().unwrap();
            let spec = specs
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(BackendError::Api { status: 404, message: "missing".into() })?;
            spec.text = text.into();
            Ok(spec.clone())
        }

        async fn update_specificity_position(
            &self,
            id: Uuid,
            position: Position,
        ) -> Result<Specificity, BackendError> {
            self.check()?;
            let mut specs = self.specs.lock().unwrap();
            let spec = specs
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(BackendError::Api { status: 404, message: "missing".into() })?;
            spec.position = Some(position);
            Ok(spec.clone())
        }

        async fn add_connection(
            &self,
            specificity_id: Uuid,
            entity_id: Uuid,
            attribute_id: Uuid,
        ) -> Result<AttributeConnection, BackendError> {
            self.check()?;
            let connection = AttributeConnection {
                id: Uuid::new_v4(),
                specificity_id,
                entity_id,
                attribute_id,
            };
            let mut specs = self.specs.lock().unwrap();
            let spec = specs
                .iter_mut()
                .find(|s| s.id == specificity_id)
                .ok_or(BackendError::Api { status: 404, message: "missing".into() })?;
            spec.attribute_connections.push(connection.clone());
            Ok(connection)
        }

        async fn remove_connection(
            &self,
            specificity_id: Uuid,
            connection_id: Uuid,
        ) -> Result<(), BackendError> {
            self.check()?;
            let mut specs = self.specs.lock().unwrap();
            if let Some(spec) = specs.iter_mut().find(|s| s.id == specificity_id) {
                spec.attribute_connections.retain(|c| c.id != connection_id);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EntityBackend for FakeBackend {
        async fn update_entity_position(
            &self,
            id: Uuid,
            position: Position,
        ) -> Result<Entity, BackendError> {
            self.check()?;
            Ok(Entity {
                id,
                name: String::new(),
                description: None,
                attribute_ids: vec![],
                position: Some(position),
            })
        }
    }

    fn taxonomy() -> (Vec<GameClass>, Attribute) {
        let attr = Attribute { id: Uuid::new_v4(), name: "Ailé".into(), description: None };
        let classes = vec![GameClass {
            id: Uuid::new_v4(),
            name: "Physique".into(),
            description: None,
            color: "#8b5cf6".into(),
            parent_id: None,
            attributes: vec![attr.clone()],
            children: vec![],
        }];
        (classes, attr)
    }

    fn entity_with(attr: &Attribute) -> Entity {
        Entity {
            id: Uuid::new_v4(),
            name: "Chauve-Terreur".into(),
            description: None,
            attribute_ids: vec![attr.id],
            position: Some(Position::new(100.0, 100.0)),
        }
    }

    async fn loaded_controller() -> (CanvasController<FakeBackend>, Entity, Attribute) {
        let (classes, attr) = taxonomy();
        let entity = entity_with(&attr);
        let mut controller = CanvasController::new(FakeBackend::default());
        controller.load(vec![entity.clone()], classes).await.unwrap();
        (controller, entity, attr)
    }

    #[tokio::test]
    async fn load_projects_entity_nodes() {
        let (controller, entity, _attr) = loaded_controller().await;
        let graph = controller.graph();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].id, entity.id.to_string());
        assert_eq!(graph.nodes[0].kind, NodeKind::Entity);
    }

    #[tokio::test]
    async fn create_flow_closes_editor_and_appends_to_cache() {
        let (mut controller, entity, attr) = loaded_controller().await;

        controller.open_editor(entity.id, attr.id);
        assert!(matches!(controller.editor(), EditorState::Creating { .. }));

        controller.set_editor_text("chasse uniquement la nuit");
        controller.save_editor().await.unwrap();

        assert_eq!(*controller.editor(), EditorState::Closed);
        assert_eq!(controller.specificities().len(), 1);
        // The new node and its edge appear in the projection.
        assert_eq!(controller.graph().nodes.len(), 2);
        assert_eq!(controller.graph().edges.len(), 1);
    }

    #[tokio::test]
    async fn reopening_pair_enters_editing_prefilled() {
        let (mut controller, entity, attr) = loaded_controller().await;
        controller.open_editor(entity.id, attr.id);
        controller.set_editor_text("premier texte");
        controller.save_editor().await.unwrap();
        let spec_id = controller.specificities()[0].id;

        controller.open_editor(entity.id, attr.id);
        assert_eq!(
            *controller.editor(),
            EditorState::Editing { specificity_id: spec_id, text: "premier texte".into() }
        );
    }

    #[tokio::test]
    async fn failed_save_keeps_dialog_open_with_input() {
        let (mut controller, entity, attr) = loaded_controller().await;
        controller.open_editor(entity.id, attr.id);
        controller.set_editor_text("texte précieux");

        controller.backend.fail_writes.store(true, Ordering::SeqCst);
        assert!(controller.save_editor().await.is_err());

        match controller.editor() {
            EditorState::Creating { text, .. } => assert_eq!(text, "texte précieux"),
            other => panic!("dialog must stay open, got {other:?}"),
        }
        assert!(controller.specificities().is_empty(), "no optimistic insert");
    }

    #[tokio::test]
    async fn text_save_never_touches_position() {
        let (mut controller, entity, attr) = loaded_controller().await;
        controller.open_editor(entity.id, attr.id);
        controller.set_editor_text("v1");
        controller.save_editor().await.unwrap();
        let spec_id = controller.specificities()[0].id;

        // Drag the node somewhere, then edit the text.
        let outcome = controller
            .drag_release(&spec_node_id(spec_id), Position::new(777.0, 42.0))
            .await;
        assert_eq!(outcome, DragOutcome::Persisted);

        controller.open_editor(entity.id, attr.id);
        controller.set_editor_text("v2");
        controller.save_editor().await.unwrap();

        let spec = &controller.specificities()[0];
        assert_eq!(spec.text, "v2");
        assert_eq!(spec.position, Some(Position::new(777.0, 42.0)));
    }

    #[tokio::test]
    async fn connect_rejects_non_specificity_target_without_request() {
        let (mut controller, entity, attr) = loaded_controller().await;
        let before = controller.backend.requests.load(Ordering::SeqCst);

        let outcome = controller
            .connect(
                &entity.id.to_string(),
                &attr.id.to_string(),
                &Uuid::new_v4().to_string(), // another entity node, not a spec
            )
            .await
            .unwrap();

        assert_eq!(outcome, ConnectOutcome::Rejected);
        assert_eq!(
            controller.backend.requests.load(Ordering::SeqCst),
            before,
            "rejected gestures must not hit the backend"
        );
    }

    #[tokio::test]
    async fn connect_grows_connections_by_one_and_adds_edge() {
        let (mut controller, entity, attr) = loaded_controller().await;
        controller.open_editor(entity.id, attr.id);
        controller.set_editor_text("sociable");
        controller.save_editor().await.unwrap();
        let spec_id = controller.specificities()[0].id;

        // Second entity connecting to the same specificity.
        let other = Entity {
            id: Uuid::new_v4(),
            name: "Spectre".into(),
            description: None,
            attribute_ids: vec![attr.id],
            position: None,
        };
        let mut entities = vec![entity.clone(), other.clone()];
        entities[0].position = Some(Position::new(100.0, 100.0));
        controller.sync_collections(entities, controller.classes.clone());

        let before = controller.specificities()[0].attribute_connections.len();
        let outcome = controller
            .connect(
                &other.id.to_string(),
                &attr.id.to_string(),
                &spec_node_id(spec_id),
            )
            .await
            .unwrap();

        assert_eq!(outcome, ConnectOutcome::Connected);
        let after = &controller.specificities()[0].attribute_connections;
        assert_eq!(after.len(), before + 1, "list grows, never replaced");
        assert_eq!(controller.graph().edges.len(), 2);
        assert!(controller
            .graph()
            .edges
            .iter()
            .any(|e| e.source == other.id.to_string()
                && e.source_handle == attr.id.to_string()));
    }

    #[tokio::test]
    async fn entity_drag_failure_reverts_position() {
        let (mut controller, entity, _attr) = loaded_controller().await;
        controller.backend.fail_writes.store(true, Ordering::SeqCst);

        let outcome = controller
            .drag_release(&entity.id.to_string(), Position::new(999.0, 999.0))
            .await;

        assert_eq!(outcome, DragOutcome::Reverted);
        let node = &controller.graph().nodes[0];
        assert_eq!(node.position, Position::new(100.0, 100.0), "pre-drag position restored");
    }

    #[tokio::test]
    async fn specificity_drag_failure_reverts_position() {
        let (mut controller, entity, attr) = loaded_controller().await;
        controller.open_editor(entity.id, attr.id);
        controller.set_editor_text("mobile");
        controller.save_editor().await.unwrap();
        let spec_id = controller.specificities()[0].id;
        let before = controller.specificities()[0].position;

        controller.backend.fail_writes.store(true, Ordering::SeqCst);
        let outcome = controller
            .drag_release(&spec_node_id(spec_id), Position::new(5.0, 5.0))
            .await;

        assert_eq!(outcome, DragOutcome::Reverted);
        assert_eq!(controller.specificities()[0].position, before);
    }

    #[tokio::test]
    async fn unknown_node_drag_is_ignored() {
        let (mut controller, _entity, _attr) = loaded_controller().await;
        let before = controller.backend.requests.load(Ordering::SeqCst);
        let outcome = controller
            .drag_release(&Uuid::new_v4().to_string(), Position::new(1.0, 1.0))
            .await;
        assert_eq!(outcome, DragOutcome::Ignored);
        assert_eq!(controller.backend.requests.load(Ordering::SeqCst), before);
    }

    #[tokio::test]
    async fn disconnect_refetches_collection() {
        let (mut controller, entity, attr) = loaded_controller().await;
        controller.open_editor(entity.id, attr.id);
        controller.set_editor_text("détachable");
        controller.save_editor().await.unwrap();
        let spec = controller.specificities()[0].clone();

        controller
            .disconnect(spec.id, spec.attribute_connections[0].id)
            .await
            .unwrap();

        assert!(controller.specificities()[0].attribute_connections.is_empty());
        assert!(controller.graph().edges.is_empty());
    }
}
