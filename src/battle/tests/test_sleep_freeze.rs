#[cfg(test)]
mod tests {
    use crate::battle::decision::Intent;
    use crate::battle::state::{ActionFailureReason, BattleEvent};
    use crate::battle::tests::common::{
        assert_ok, create_team_battle, create_test_battle, p1, predictable_rng, scripted_battle, scripted_rng,
        TestCombatantBuilder,
    };
    use crate::player::CombatantId;
    use crate::pokemon::Status;
    use pretty_assertions::assert_eq;
    use schema::StatusKind;

    fn moved(events: &[BattleEvent], id: CombatantId) -> bool {
        events
            .iter()
            .any(|event| matches!(event, BattleEvent::MoveUsed { user, .. } if *user == id))
    }

    fn cancelled(events: &[BattleEvent], id: CombatantId, reason: ActionFailureReason) -> bool {
        events.contains(&BattleEvent::MoveCancelled { user: id, reason })
    }

    #[test]
    fn test_sleep_lasts_the_drawn_number_of_moves() {
        // Arrange: the sleep duration draw comes out as 2.
        let snorlax = TestCombatantBuilder::new("Snorlax", 50).build();
        let pikachu = TestCombatantBuilder::new("Pikachu", 50).with_moves(&["Harden"]).build();
        let mut battle = scripted_battle(create_test_battle(snorlax, pikachu), vec![], vec![], scripted_rng(&[2]));
        assert!(assert_ok(battle.afflict(p1(0), StatusKind::Sleep)));

        // Act & Assert
        let first = battle.run_turn().unwrap();
        assert!(cancelled(first.events(), p1(0), ActionFailureReason::IsAsleep));
        assert!(!moved(first.events(), p1(0)));
        assert_eq!(battle.state().combatant(p1(0)).unwrap().status(), Status::Asleep);

        let second = battle.run_turn().unwrap();
        assert!(cancelled(second.events(), p1(0), ActionFailureReason::IsAsleep));
        assert!(second.events().contains(&BattleEvent::StatusCured {
            target: p1(0),
            status: StatusKind::Sleep,
        }));

        let third = battle.run_turn().unwrap();
        assert!(moved(third.events(), p1(0)));
        assert!(battle.listeners().listeners_for(p1(0)).is_empty());
    }

    #[test]
    fn test_sleeping_combatant_can_still_switch() {
        let team = vec![
            TestCombatantBuilder::new("Snorlax", 50).build(),
            TestCombatantBuilder::new("Eevee", 50).build(),
        ];
        let pikachu = TestCombatantBuilder::new("Pikachu", 50).with_moves(&["Harden"]).build();
        let mut battle = scripted_battle(
            create_team_battle(team, vec![pikachu]),
            vec![Intent::Switch(1)],
            vec![],
            scripted_rng(&[3]),
        );
        assert!(assert_ok(battle.afflict(p1(0), StatusKind::Sleep)));

        let bus = battle.run_turn().unwrap();

        assert!(bus
            .events()
            .iter()
            .any(|event| matches!(event, BattleEvent::CombatantSwitched { incoming, .. } if *incoming == p1(1))));
        assert!(!bus
            .events()
            .iter()
            .any(|event| matches!(event, BattleEvent::MoveCancelled { .. })));
        // Still asleep on the bench.
        assert!(battle.state().combatant(p1(0)).unwrap().has_status(StatusKind::Sleep));
    }

    #[test]
    fn test_freeze_cancels_until_thaw() {
        // Arrange: 90 stays frozen, 10 thaws.
        let snorlax = TestCombatantBuilder::new("Snorlax", 50).build();
        let pikachu = TestCombatantBuilder::new("Pikachu", 50).with_moves(&["Harden"]).build();
        let mut battle = scripted_battle(create_test_battle(snorlax, pikachu), vec![], vec![], scripted_rng(&[90, 10]));
        assert!(assert_ok(battle.afflict(p1(0), StatusKind::Freeze)));

        // Act & Assert
        let first = battle.run_turn().unwrap();
        assert!(cancelled(first.events(), p1(0), ActionFailureReason::IsFrozen));
        assert!(!moved(first.events(), p1(0)));

        let second = battle.run_turn().unwrap();
        assert!(second.events().contains(&BattleEvent::StatusCured {
            target: p1(0),
            status: StatusKind::Freeze,
        }));
        assert!(moved(second.events(), p1(0)));
        assert_eq!(battle.state().combatant(p1(0)).unwrap().status(), Status::Healthy);
    }

    #[test]
    fn test_afflict_refuses_second_status() {
        let snorlax = TestCombatantBuilder::new("Snorlax", 50)
            .with_status(StatusKind::Poison)
            .build();
        let pikachu = TestCombatantBuilder::new("Pikachu", 50).build();
        let mut battle = scripted_battle(create_test_battle(snorlax, pikachu), vec![], vec![], predictable_rng());

        assert!(!assert_ok(battle.afflict(p1(0), StatusKind::Freeze)));
        assert_eq!(battle.state().combatant(p1(0)).unwrap().status(), Status::Poisoned);
    }
}
