//! Right-click menu contents per shape type.

use crate::scene::ZOrder;
use crate::shapes::{Shape, ShapeId};
use kurbo::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Open the bound entity's detail view (domain nodes only).
    OpenDetail,
    EditText,
    Duplicate,
    BringForward,
    SendBackward,
    BringToFront,
    SendToBack,
    Delete,
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            MenuAction::OpenDetail => "Open details",
            MenuAction::EditText => "Edit text",
            MenuAction::Duplicate => "Duplicate",
            MenuAction::BringForward => "Bring forward",
            MenuAction::SendBackward => "Send backward",
            MenuAction::BringToFront => "Bring to front",
            MenuAction::SendToBack => "Send to back",
            MenuAction::Delete => "Delete",
        }
    }

    pub fn z_order(self) -> Option<ZOrder> {
        match self {
            MenuAction::BringForward => Some(ZOrder::Forward),
            MenuAction::SendBackward => Some(ZOrder::Backward),
            MenuAction::BringToFront => Some(ZOrder::Front),
            MenuAction::SendToBack => Some(ZOrder::Back),
            _ => None,
        }
    }
}

/// An open context menu anchored at a screen position.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub target: ShapeId,
    pub position: Point,
    pub actions: Vec<MenuAction>,
}

impl ContextMenu {
    pub fn for_shape(shape: &Shape, position: Point) -> Self {
        Self {
            target: shape.id().clone(),
            position,
            actions: actions_for(shape),
        }
    }

    pub fn offers(&self, action: MenuAction) -> bool {
        self.actions.contains(&action)
    }
}

/// Type-specific entries first, then the common ones.
pub fn actions_for(shape: &Shape) -> Vec<MenuAction> {
    let mut actions = match shape {
        Shape::DomainNode(_) => vec![MenuAction::OpenDetail],
        Shape::Text(_) | Shape::StickyNote(_) => vec![MenuAction::EditText],
        _ => Vec::new(),
    };
    actions.extend([
        MenuAction::Duplicate,
        MenuAction::BringForward,
        MenuAction::SendBackward,
        MenuAction::BringToFront,
        MenuAction::SendToBack,
        MenuAction::Delete,
    ]);
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{DomainEntity, ShapeFactory, ShapeKind, ShapeSpec};

    #[test]
    fn test_domain_node_offers_detail() {
        let mut factory = ShapeFactory::default();
        let entity = DomainEntity {
            id: "co-1".to_string(),
            name: "Acme".to_string(),
            category_color: None,
        };
        let node = factory.create_domain_node(&entity, Point::ZERO, 24);
        let menu = ContextMenu::for_shape(&node, Point::new(5.0, 5.0));
        assert_eq!(menu.actions[0], MenuAction::OpenDetail);
        assert!(!menu.offers(MenuAction::EditText));
        assert!(menu.offers(MenuAction::Delete));
    }

    #[test]
    fn test_plain_shape_has_common_actions_only() {
        let mut factory = ShapeFactory::default();
        let rect = factory.create(&ShapeSpec::new(ShapeKind::Rectangle, Point::ZERO));
        let actions = actions_for(&rect);
        assert_eq!(actions.len(), 6);
        assert_eq!(MenuAction::SendToBack.z_order(), Some(ZOrder::Back));
        assert_eq!(MenuAction::Delete.z_order(), None);
    }
}
