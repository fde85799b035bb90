#[cfg(test)]
mod tests {
    use crate::battle::decision::{ChoiceRequest, DecisionProvider, FirstUsableMove, Intent, ScriptedProvider};
    use crate::battle::state::BattleEvent;
    use crate::battle::tests::common::{
        battle_with_providers, count_events, create_team_battle, create_test_battle, p1, predictable_rng,
        scripted_battle, TestCombatantBuilder,
    };
    use crate::config::BattleConfig;
    use crate::errors::ChoiceError;
    use crate::player::SideId;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Always asks for a move that does not exist and counts how often it is asked.
    struct AlwaysIllegal {
        asked: Rc<Cell<u32>>,
        rejected: Rc<Cell<u32>>,
    }

    impl DecisionProvider for AlwaysIllegal {
        fn request_choice(&mut self, _request: &ChoiceRequest) -> Intent {
            self.asked.set(self.asked.get() + 1);
            Intent::Move(9)
        }

        fn on_rejected(&mut self, _request: &ChoiceRequest, _error: &ChoiceError) {
            self.rejected.set(self.rejected.get() + 1);
        }
    }

    fn rejected_for(event: &BattleEvent, side: SideId) -> bool {
        matches!(event, BattleEvent::ChoiceRejected { side: rejected, .. } if *rejected == side)
    }

    #[test]
    fn test_illegal_choices_are_reprompted() {
        // Arrange: an unknown move, then the active combatant itself, then Tackle.
        let red_team = vec![
            TestCombatantBuilder::new("Pikachu", 50).build(),
            TestCombatantBuilder::new("Eevee", 50).build(),
        ];
        let snorlax = TestCombatantBuilder::new("Snorlax", 50).with_moves(&["Harden"]).build();
        let mut battle = scripted_battle(
            create_team_battle(red_team, vec![snorlax]),
            vec![Intent::Move(5), Intent::Switch(0), Intent::Move(0)],
            vec![],
            predictable_rng(),
        );

        // Act
        let bus = battle.run_turn().unwrap();

        // Assert
        assert_eq!(count_events(bus.events(), |event| rejected_for(event, SideId::Player1)), 2);
        assert!(bus.events().contains(&BattleEvent::ChoiceMade {
            side: SideId::Player1,
            intent: Intent::Move(0),
        }));
        assert!(bus.events().contains(&BattleEvent::MoveUsed {
            user: p1(0),
            move_name: "Tackle".to_string(),
        }));
    }

    #[test]
    fn test_exhausted_attempts_fall_back_to_first_legal_choice() {
        // Arrange
        let asked = Rc::new(Cell::new(0));
        let rejected = Rc::new(Cell::new(0));
        let provider = AlwaysIllegal {
            asked: Rc::clone(&asked),
            rejected: Rc::clone(&rejected),
        };
        let config = BattleConfig {
            max_choice_attempts: 3,
            ..BattleConfig::default()
        };
        let state = create_test_battle(
            TestCombatantBuilder::new("Pikachu", 50).build(),
            TestCombatantBuilder::new("Eevee", 50).build(),
        );
        let mut battle = battle_with_providers(
            state,
            Box::new(provider),
            Box::new(FirstUsableMove),
            predictable_rng(),
            config,
        );

        // Act
        let bus = battle.run_turn().unwrap();

        // Assert: every answer is rejected, then the turn goes on with Tackle.
        assert_eq!(asked.get(), 3);
        assert_eq!(rejected.get(), 3);
        assert_eq!(count_events(bus.events(), |event| rejected_for(event, SideId::Player1)), 3);
        assert!(bus.events().contains(&BattleEvent::ChoiceRejected {
            side: SideId::Player1,
            reason: ChoiceError::UnknownMove(9).to_string(),
        }));
        assert!(bus.events().contains(&BattleEvent::ChoiceMade {
            side: SideId::Player1,
            intent: Intent::Move(0),
        }));
        assert!(bus.events().contains(&BattleEvent::MoveUsed {
            user: p1(0),
            move_name: "Tackle".to_string(),
        }));
        assert!(bus.events().contains(&BattleEvent::TurnEnded { turn_number: 1 }));
        assert!(!battle.is_over());
    }

    #[test]
    fn test_struggle_is_chosen_without_prompting() {
        // Arrange: Pikachu's only move is out of PP.
        let mut pikachu = TestCombatantBuilder::new("Pikachu", 50).build();
        pikachu.moves[0].pp = 0;
        let snorlax = TestCombatantBuilder::new("Snorlax", 50).with_moves(&["Harden"]).build();
        let asked = Rc::new(Cell::new(0));
        let provider = AlwaysIllegal {
            asked: Rc::clone(&asked),
            rejected: Rc::new(Cell::new(0)),
        };
        let mut battle = battle_with_providers(
            create_test_battle(pikachu, snorlax),
            Box::new(provider),
            Box::new(FirstUsableMove),
            predictable_rng(),
            BattleConfig::default(),
        );

        // Act
        let bus = battle.run_turn().unwrap();

        // Assert
        assert_eq!(asked.get(), 0);
        assert!(bus.events().contains(&BattleEvent::ChoiceMade {
            side: SideId::Player1,
            intent: Intent::Struggle,
        }));
        assert!(bus.events().contains(&BattleEvent::MoveUsed {
            user: p1(0),
            move_name: "Struggle".to_string(),
        }));
    }

    #[test]
    fn test_replacement_rejects_moves() {
        // Arrange: Rattata faints; Blue first tries to attack with the fainted combatant.
        let pikachu = TestCombatantBuilder::new("Pikachu", 50).build();
        let blue_team = vec![
            TestCombatantBuilder::new("Rattata", 50).with_hp(1).build(),
            TestCombatantBuilder::new("Eevee", 50).build(),
        ];
        let mut battle = battle_with_providers(
            create_team_battle(vec![pikachu], blue_team),
            Box::new(FirstUsableMove),
            Box::new(ScriptedProvider::new(vec![
                Intent::Move(0),
                Intent::Move(0),
                Intent::Switch(1),
            ])),
            predictable_rng(),
            BattleConfig::default(),
        );

        // Act
        let bus = battle.run_turn().unwrap();

        // Assert: the turn choice is accepted, the replacement move is rejected once.
        let rejections: Vec<&BattleEvent> = bus
            .events()
            .iter()
            .filter(|event| rejected_for(event, SideId::Player2))
            .collect();
        assert_eq!(
            rejections,
            vec![&BattleEvent::ChoiceRejected {
                side: SideId::Player2,
                reason: ChoiceError::ReplacementRequired.to_string(),
            }]
        );
        assert_eq!(battle.state().side(SideId::Player2).active_index(0).unwrap(), 1);
    }
}
