use super::simulation::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MoveUpLeft,
    MoveUpRight,
    MoveDownLeft,
    MoveDownRight,
    Activate,
}

const ACTION_COUNT: usize = 9;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::MoveUpLeft => 4,
            InputAction::MoveUpRight => 5,
            InputAction::MoveDownLeft => 6,
            InputAction::MoveDownRight => 7,
            InputAction::Activate => 8,
        }
    }

    /// Screen-space direction of a movement action (y grows downward).
    /// `Activate` has no direction.
    pub fn direction(self) -> Option<(i8, i8)> {
        match self {
            InputAction::MoveUp => Some((0, -1)),
            InputAction::MoveDown => Some((0, 1)),
            InputAction::MoveLeft => Some((-1, 0)),
            InputAction::MoveRight => Some((1, 0)),
            InputAction::MoveUpLeft => Some((-1, -1)),
            InputAction::MoveUpRight => Some((1, -1)),
            InputAction::MoveDownLeft => Some((-1, 1)),
            InputAction::MoveDownRight => Some((1, 1)),
            InputAction::Activate => None,
        }
    }

    pub const MOVEMENT: [InputAction; 8] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::MoveUpLeft,
        InputAction::MoveUpRight,
        InputAction::MoveDownLeft,
        InputAction::MoveDownRight,
    ];
}

/// Input polled once per tick. Held actions are level-triggered; presses
/// (`activate`, `submit`, `cancel`, clicks) are edge-triggered and only
/// appear in the first snapshot after the key went down.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    activate_pressed: bool,
    submit_pressed: bool,
    cancel_pressed: bool,
    backspace_presses: u32,
    text_input: String,
    click_world: Option<Vec2>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        activate_pressed: bool,
        submit_pressed: bool,
        cancel_pressed: bool,
        backspace_presses: u32,
        text_input: String,
        click_world: Option<Vec2>,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            activate_pressed,
            submit_pressed,
            cancel_pressed,
            backspace_presses,
            text_input,
            click_world,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn activate_pressed(&self) -> bool {
        self.activate_pressed
    }

    pub fn submit_pressed(&self) -> bool {
        self.submit_pressed
    }

    pub fn cancel_pressed(&self) -> bool {
        self.cancel_pressed
    }

    pub fn backspace_presses(&self) -> u32 {
        self.backspace_presses
    }

    pub fn text_input(&self) -> &str {
        &self.text_input
    }

    pub fn click_world(&self) -> Option<Vec2> {
        self.click_world
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        if action == InputAction::Activate && is_down {
            self.activate_pressed = true;
        }
        self
    }

    pub fn with_activate_pressed(mut self, pressed: bool) -> Self {
        self.activate_pressed = pressed;
        self
    }

    pub fn with_submit_pressed(mut self, pressed: bool) -> Self {
        self.submit_pressed = pressed;
        self
    }

    pub fn with_cancel_pressed(mut self, pressed: bool) -> Self {
        self.cancel_pressed = pressed;
        self
    }

    pub fn with_backspace_presses(mut self, presses: u32) -> Self {
        self.backspace_presses = presses;
        self
    }

    pub fn with_text_input(mut self, text: impl Into<String>) -> Self {
        self.text_input = text.into();
        self
    }

    pub fn with_click_world(mut self, click_world: Option<Vec2>) -> Self {
        self.click_world = click_world;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_states_track_each_action_independently() {
        let mut states = ActionStates::default();
        states.set(InputAction::MoveUpLeft, true);
        states.set(InputAction::Activate, true);
        states.set(InputAction::Activate, false);
        assert!(states.is_down(InputAction::MoveUpLeft));
        assert!(!states.is_down(InputAction::Activate));
        assert!(!states.is_down(InputAction::MoveUp));
    }

    #[test]
    fn movement_actions_have_unit_grid_directions() {
        for action in InputAction::MOVEMENT {
            let (dx, dy) = action.direction().expect("movement action has direction");
            assert!(dx.abs() <= 1 && dy.abs() <= 1);
            assert!(dx != 0 || dy != 0);
        }
        assert_eq!(InputAction::Activate.direction(), None);
    }

    #[test]
    fn builder_sets_activate_edge_with_action() {
        let snapshot = InputSnapshot::empty().with_action_down(InputAction::Activate, true);
        assert!(snapshot.activate_pressed());
        assert!(snapshot.is_down(InputAction::Activate));
    }

    #[test]
    fn builder_carries_text_and_click() {
        let snapshot = InputSnapshot::empty()
            .with_text_input("par")
            .with_backspace_presses(2)
            .with_click_world(Some(Vec2::new(10.0, 20.0)));
        assert_eq!(snapshot.text_input(), "par");
        assert_eq!(snapshot.backspace_presses(), 2);
        assert_eq!(snapshot.click_world(), Some(Vec2::new(10.0, 20.0)));
    }
}
