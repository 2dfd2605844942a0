//! Node state machine.

/// Lifecycle of a loaded node.
///
/// `Unloaded -> Loading -> Loaded -> Unloading -> Unloaded`. A node that is
/// unloading has to reach `Unloaded` before it can load again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    /// Created, or fully torn down.
    #[default]
    Unloaded,

    /// Dependencies are being acquired.
    Loading,

    /// Every dependency has completed, successfully or not.
    Loaded,

    /// Dependencies are being released.
    Unloading,
}

impl NodeState {
    pub fn is_unloaded(&self) -> bool {
        matches!(self, NodeState::Unloaded)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, NodeState::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, NodeState::Loaded)
    }

    pub fn is_unloading(&self) -> bool {
        matches!(self, NodeState::Unloading)
    }

    /// Returns true if a load or unload is in flight.
    pub fn is_processing(&self) -> bool {
        self.is_loading() || self.is_unloading()
    }

    /// The only state `self` may move to.
    pub fn next(&self) -> NodeState {
        match self {
            NodeState::Unloaded => NodeState::Loading,
            NodeState::Loading => NodeState::Loaded,
            NodeState::Loaded => NodeState::Unloading,
            NodeState::Unloading => NodeState::Unloaded,
        }
    }

    /// Move to `to` if that is the legal next state.
    pub fn advance(&mut self, to: NodeState) -> bool {
        if self.next() == to {
            *self = to;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let mut state = NodeState::default();
        for to in [
            NodeState::Loading,
            NodeState::Loaded,
            NodeState::Unloading,
            NodeState::Unloaded,
            NodeState::Loading,
        ] {
            assert!(state.advance(to));
        }
        assert!(state.is_processing());
    }

    #[test]
    fn test_no_shortcut_from_unloading() {
        let mut state = NodeState::Unloading;
        assert!(!state.advance(NodeState::Loading));
        assert!(!state.advance(NodeState::Loaded));
        assert_eq!(state, NodeState::Unloading);
    }
}
