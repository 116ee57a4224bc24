//! Drag-and-drop of external entities onto the canvas.

use crate::camera::Camera;
use crate::scene::{SceneAdapter, SceneResult};
use crate::shapes::{DomainEntity, Shape, ShapeFactory, ShapeId};
use crate::style::StyleEngine;
use kurbo::Point;

/// Result of dropping an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Inserted(ShapeId),
    /// The entity is already on the canvas; nothing changed.
    Duplicate(ShapeId),
}

/// Maps client (page) coordinates onto the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DropZone {
    /// Client position of the canvas element's top-left corner.
    pub origin: Point,
}

impl DropZone {
    pub fn new(origin: Point) -> Self {
        Self { origin }
    }

    pub fn to_world(&self, camera: &Camera, client: Point) -> Point {
        camera.screen_to_world(client - self.origin.to_vec2())
    }
}

/// Decode the drag payload a data source attaches to a drag.
pub fn parse_payload(payload: &str) -> Result<DomainEntity, serde_json::Error> {
    serde_json::from_str(payload)
}

/// Live domain node already bound to `external_ref`.
pub fn find_bound(scene: &dyn SceneAdapter, external_ref: &str) -> Option<ShapeId> {
    scene
        .shapes()
        .iter()
        .find(|s| {
            matches!(s, Shape::DomainNode(_))
                && !s.is_deleted()
                && s.external_ref() == Some(external_ref)
        })
        .map(|s| s.id().clone())
}

/// Insert a domain node for `entity` centred on `world`, unless one is
/// already bound to it.
pub fn drop_entity(
    scene: &mut dyn SceneAdapter,
    factory: &mut ShapeFactory,
    style: &StyleEngine,
    entity: &DomainEntity,
    world: Point,
    wrap_chars: usize,
) -> SceneResult<DropOutcome> {
    if let Some(existing) = find_bound(scene, &entity.id) {
        log::debug!("entity {} already on canvas as {}", entity.id, existing);
        return Ok(DropOutcome::Duplicate(existing));
    }
    let mut node = factory.create_domain_node(entity, world, wrap_chars);
    style.stamp(&mut node);
    let id = node.id().clone();
    scene.add(node)?;
    log::debug!("dropped entity {} as {}", entity.id, id);
    Ok(DropOutcome::Inserted(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::scene::SceneIndex;
    use kurbo::Vec2;

    fn acme() -> DomainEntity {
        DomainEntity {
            id: "co-42".to_string(),
            name: "Acme Corporation International Holdings".to_string(),
            category_color: Some("#ff8800".to_string()),
        }
    }

    #[test]
    fn test_client_to_world() {
        let zone = DropZone::new(Point::new(100.0, 50.0));
        let mut camera = Camera::new();
        camera.pan(Vec2::new(20.0, 0.0));
        camera.zoom = 2.0;
        assert_eq!(zone.to_world(&camera, Point::new(140.0, 70.0)), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_drop_is_idempotent() {
        let mut scene = SceneIndex::new();
        let mut factory = ShapeFactory::default();
        let style = StyleEngine::new(&EditorConfig::default());
        let entity = acme();

        let first = drop_entity(&mut scene, &mut factory, &style, &entity, Point::new(300.0, 200.0), 24).unwrap();
        let DropOutcome::Inserted(id) = first else {
            panic!("first drop should insert");
        };
        let node = scene.get(&id).unwrap();
        assert_eq!(node.external_ref(), Some("co-42"));
        assert!((node.center() - Point::new(300.0, 200.0)).hypot() < 1e-9);

        let second = drop_entity(&mut scene, &mut factory, &style, &entity, Point::ZERO, 24).unwrap();
        assert_eq!(second, DropOutcome::Duplicate(id));
        assert_eq!(scene.shapes().len(), 1);
    }

    #[test]
    fn test_deleted_node_does_not_block_drop() {
        let mut scene = SceneIndex::new();
        let mut factory = ShapeFactory::default();
        let style = StyleEngine::new(&EditorConfig::default());
        let entity = acme();
        let DropOutcome::Inserted(id) =
            drop_entity(&mut scene, &mut factory, &style, &entity, Point::ZERO, 24).unwrap()
        else {
            panic!("first drop should insert");
        };
        scene.remove(&id).unwrap();
        let again = drop_entity(&mut scene, &mut factory, &style, &entity, Point::ZERO, 24).unwrap();
        assert!(matches!(again, DropOutcome::Inserted(_)));
    }

    #[test]
    fn test_parse_payload() {
        let entity = parse_payload(r#"{"id":"co-1","name":"Acme","categoryColor":null}"#).unwrap();
        assert_eq!(entity.name, "Acme");
        assert!(parse_payload("not json").is_err());
    }
}
