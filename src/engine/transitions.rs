use std::fmt;

/// Tags of the screens a session can be on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKind {
    PreAuth,
    Login,
    Register,
    MainMenu,
    TimerTest,
    ZenMode,
    WordCountTest,
    Settings,
    Results,
    Replay,
}

impl StateKind {
    pub const ALL: [StateKind; 10] = [
        StateKind::PreAuth,
        StateKind::Login,
        StateKind::Register,
        StateKind::MainMenu,
        StateKind::TimerTest,
        StateKind::ZenMode,
        StateKind::WordCountTest,
        StateKind::Settings,
        StateKind::Results,
        StateKind::Replay,
    ];

    /// Legal successors of this state.
    pub fn valid_transitions(self) -> &'static [StateKind] {
        use StateKind::*;
        match self {
            PreAuth => &[Login, Register, MainMenu],
            Login => &[MainMenu, PreAuth],
            Register => &[MainMenu, PreAuth],
            MainMenu => &[TimerTest, ZenMode, WordCountTest, Settings],
            TimerTest => &[Results, MainMenu],
            ZenMode => &[MainMenu],
            WordCountTest => &[Results, MainMenu],
            Settings => &[MainMenu],
            Results => &[MainMenu, Replay, TimerTest, WordCountTest],
            Replay => &[MainMenu, Results],
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateKind::PreAuth => "pre-auth",
            StateKind::Login => "login",
            StateKind::Register => "register",
            StateKind::MainMenu => "main menu",
            StateKind::TimerTest => "timer test",
            StateKind::ZenMode => "zen mode",
            StateKind::WordCountTest => "word count test",
            StateKind::Settings => "settings",
            StateKind::Results => "results",
            StateKind::Replay => "replay",
        };
        f.write_str(name)
    }
}

pub fn validate_transition(from: StateKind, to: StateKind) -> bool {
    from.valid_transitions().contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_edges() {
        assert!(validate_transition(StateKind::MainMenu, StateKind::TimerTest));
        assert!(validate_transition(StateKind::MainMenu, StateKind::Settings));
        assert!(!validate_transition(StateKind::MainMenu, StateKind::Results));
        assert!(!validate_transition(StateKind::MainMenu, StateKind::Replay));
    }

    #[test]
    fn test_settings_cannot_reach_replay() {
        assert!(!validate_transition(StateKind::Settings, StateKind::Replay));
    }

    #[test]
    fn test_zen_has_no_results() {
        assert_eq!(StateKind::ZenMode.valid_transitions(), &[StateKind::MainMenu]);
    }

    #[test]
    fn test_no_self_edges() {
        for state in StateKind::ALL {
            assert!(!validate_transition(state, state), "{state} loops to itself");
        }
    }

    #[test]
    fn test_every_state_reachable_from_pre_auth() {
        let mut seen = vec![StateKind::PreAuth];
        let mut frontier = vec![StateKind::PreAuth];
        while let Some(state) = frontier.pop() {
            for &next in state.valid_transitions() {
                if !seen.contains(&next) {
                    seen.push(next);
                    frontier.push(next);
                }
            }
        }
        assert_eq!(seen.len(), StateKind::ALL.len());
    }

    #[test]
    fn test_every_other_state_can_reach_main_menu() {
        for state in StateKind::ALL {
            let can = validate_transition(state, StateKind::MainMenu);
            let expected = state != StateKind::MainMenu;
            assert_eq!(can, expected, "{state}");
        }
    }
}
