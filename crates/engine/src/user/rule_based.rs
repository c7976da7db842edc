//! Rule-based user simulator
//!
//! Goal-directed agenda: the user opens with one goal constraint and one
//! request target, then reacts to each agent intent with a fixed rule
//! that moves goal slots between pending requests, revealed informs and
//! the rest still to be dealt with.

use dialogue_sim_config::{ConfigError, SuccessCriterion, UserConfig};
use dialogue_sim_core::{
    DialogAct, DialogueStatus, Goal, GoalSet, Intent, SlotValue, TASK_COMPLETE_SLOT,
};
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;

use super::UserInternalState;
use crate::error::Result;

pub struct RuleBasedUser {
    goals: GoalSet,
    config: UserConfig,
    goal: Goal,
    goal_index: usize,
    state: UserInternalState,
    turn: u32,
    status: DialogueStatus,
    /// Set when the user denied a completed task that broke a constraint
    constraint_violated: bool,
}

impl RuleBasedUser {
    pub fn new(goals: GoalSet, config: UserConfig) -> Result<Self> {
        if config.initial_intents.is_empty() {
            return Err(ConfigError::MissingField("user.initial_intents".to_string()).into());
        }

        Ok(Self {
            goals,
            config,
            goal: Goal::default(),
            goal_index: 0,
            state: UserInternalState::default(),
            turn: 0,
            status: DialogueStatus::Ongoing,
            constraint_violated: false,
        })
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn goal_index(&self) -> usize {
        self.goal_index
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn status(&self) -> DialogueStatus {
        self.status
    }

    pub fn state(&self) -> &UserInternalState {
        &self.state
    }

    pub fn reset<R: Rng>(&mut self, rng: &mut R) -> DialogAct {
        self.goal_index = rng.gen_range(0..self.goals.len());
        let mut goal = self.goals.get(self.goal_index).cloned().unwrap_or_default();
        if let Some(slot) = &self.config.default_request_slot {
            if !goal.is_constraint(slot) {
                goal.request_targets.insert(slot.clone());
            }
        }
        self.goal = goal;

        self.state.clear();
        self.status = DialogueStatus::Ongoing;
        self.constraint_violated = false;

        self.sample_opening(rng);
        self.turn = 1;

        let act = self.compose();
        tracing::debug!(
            goal_index = self.goal_index,
            act = %act,
            rest = self.state.rest_slots.len(),
            "User opened dialogue"
        );
        act
    }

    pub fn step<R: Rng>(
        &mut self,
        agent_action: &DialogAct,
        rng: &mut R,
    ) -> (DialogAct, DialogueStatus) {
        self.turn += 2;

        match &agent_action.intent {
            Intent::Inform => {
                self.begin_turn();
                self.response_inform(agent_action, rng);
            }
            Intent::Request => {
                self.begin_turn();
                self.response_request(agent_action, rng);
            }
            Intent::ConfirmAnswer => {
                self.begin_turn();
                self.response_confirm_answer(rng);
            }
            Intent::MultipleChoice => {
                self.begin_turn();
                self.response_multiple_choice(agent_action, rng);
            }
            Intent::Thanks | Intent::Closing => {
                self.begin_turn();
                self.response_closing(agent_action);
            }
            other => {
                tracing::warn!(
                    intent = %other,
                    turn = self.turn,
                    "Unhandled agent intent, user state unchanged"
                );
            }
        }

        let act = self.compose();
        tracing::debug!(
            agent = %agent_action,
            user = %act,
            pending = self.state.request_slots.len(),
            rest = self.state.rest_slots.len(),
            status = %self.status,
            "User responded"
        );
        (act, self.status)
    }

    fn sample_opening<R: Rng>(&mut self, rng: &mut R) {
        let (intent, mandatory) = match self.config.initial_intents.choose(rng) {
            Some(template) => (template.intent.clone(), template.mandatory_slots.clone()),
            None => (Intent::Request, Vec::new()),
        };
        self.state.current_intent = intent;

        if let Some((slot, value)) = self.goal.inform_constraints.iter().choose(rng) {
            self.state
                .inform_slots
                .insert(slot.clone(), SlotValue::value(value.as_str()));
        }
        for slot in mandatory {
            if let Some(value) = self.goal.constraint(&slot) {
                self.state.inform_slots.insert(slot, SlotValue::value(value));
            }
        }

        self.state.rest_slots = self
            .goal
            .inform_constraints
            .keys()
            .filter(|slot| !self.state.inform_slots.contains_key(*slot))
            .chain(self.goal.request_targets.iter())
            .cloned()
            .collect();

        let request = self
            .goal
            .request_targets
            .iter()
            .filter(|slot| !self.is_default(slot))
            .choose(rng)
            .cloned()
            .or_else(|| self.pending_default());
        if let Some(slot) = request {
            self.state.request_slots.insert(slot, SlotValue::Unknown);
        }

        if self.state.request_slots.is_empty() {
            self.state.current_intent = Intent::Inform;
        }
    }

    /// Slots informed last turn become history
    fn begin_turn(&mut self) {
        let informed = std::mem::take(&mut self.state.inform_slots);
        self.state.history_slots.extend(informed);
    }

    fn compose(&self) -> DialogAct {
        let inform_slots = self.state.inform_slots.clone();
        let request_slots = self
            .state
            .request_slots
            .keys()
            .filter(|slot| !inform_slots.contains_key(*slot))
            .cloned()
            .collect();

        let mut act = DialogAct::user(self.state.current_intent.clone())
            .with_turn(self.turn.saturating_sub(1));
        act.inform_slots = inform_slots;
        act.request_slots = request_slots;
        act
    }

    fn is_default(&self, slot: &str) -> bool {
        self.config.default_request_slot.as_deref() == Some(slot)
    }

    /// Default request slot, if the goal still has to ask for it
    fn pending_default(&self) -> Option<String> {
        self.config
            .default_request_slot
            .as_ref()
            .filter(|slot| self.state.rest_slots.contains(*slot))
            .cloned()
    }

    /// Inform a rest constraint or request a rest target
    fn reveal(&mut self, slot: &str) {
        if let Some(value) = self.goal.constraint(slot) {
            self.state
                .inform_slots
                .insert(slot.to_string(), SlotValue::value(value));
            self.state.rest_slots.remove(slot);
            self.state.current_intent = Intent::Inform;
        } else if self.goal.is_target(slot) {
            self.state
                .request_slots
                .insert(slot.to_string(), SlotValue::Unknown);
            self.state.current_intent = Intent::Request;
        }
    }

    fn request(&mut self, slot: String) {
        self.state.request_slots.insert(slot, SlotValue::Unknown);
        self.state.current_intent = Intent::Request;
    }

    /// Keep asking, reveal the next rest slot, or close
    fn advance<R: Rng>(&mut self, rng: &mut R) {
        if !self.state.request_slots.is_empty() {
            self.state.current_intent = Intent::Request;
            return;
        }

        let next = self
            .state
            .rest_slots
            .iter()
            .filter(|slot| !self.is_default(slot))
            .choose(rng)
            .cloned();

        match (next, self.pending_default()) {
            (Some(slot), _) => self.reveal(&slot),
            (None, Some(default)) => self.request(default),
            (None, None) => self.state.current_intent = Intent::Thanks,
        }
    }

    fn response_inform<R: Rng>(&mut self, agent: &DialogAct, rng: &mut R) {
        if agent.is_task_complete() {
            self.check_completed_task(agent);
            return;
        }

        if agent.inform_slots.is_empty() {
            self.advance(rng);
            return;
        }

        for (slot, value) in &agent.inform_slots {
            self.state.history_slots.insert(slot.clone(), value.clone());

            match self.goal.constraint(slot).map(str::to_string) {
                Some(expected) if value.matches(&expected) => {
                    self.state.rest_slots.remove(slot);
                    self.advance(rng);
                }
                Some(expected) => {
                    // Wrong value for a constraint: restate the right one.
                    self.state
                        .inform_slots
                        .insert(slot.clone(), SlotValue::value(expected));
                    self.state.rest_slots.remove(slot);
                    self.state.current_intent = Intent::Inform;
                }
                None => {
                    self.state.rest_slots.remove(slot);
                    self.state.request_slots.remove(slot);
                    self.advance(rng);
                }
            }
        }
    }

    fn check_completed_task(&mut self, agent: &DialogAct) {
        self.state.current_intent = Intent::Thanks;

        if agent.inform_slots.get(TASK_COMPLETE_SLOT) == Some(&SlotValue::NoMatch) {
            self.state
                .history_slots
                .insert(TASK_COMPLETE_SLOT.to_string(), SlotValue::NoMatch);
            if let Some(default) = self.config.default_request_slot.clone() {
                self.state.rest_slots.remove(&default);
                self.state.request_slots.remove(&default);
            }
        }

        let violated = self.goal.inform_constraints.iter().find(|(slot, expected)| {
            !agent
                .inform_slots
                .get(*slot)
                .map(|offered| offered.matches(expected))
                .unwrap_or(false)
        });

        if let Some((slot, expected)) = violated {
            tracing::debug!(
                slot = %slot,
                expected = %expected,
                offered = ?agent.inform_slots.get(slot),
                "Completed task violates goal constraint"
            );
            self.state.current_intent = Intent::Deny;
            self.state.request_slots.clear();
            self.state.inform_slots.clear();
            self.constraint_violated = true;
        }
    }

    fn response_request<R: Rng>(&mut self, agent: &DialogAct, rng: &mut R) {
        let Some(slot) = agent.request_slots.iter().next().cloned() else {
            if let Some(slot) = self.state.rest_slots.iter().choose(rng).cloned() {
                self.reveal(&slot);
            }
            return;
        };

        if let Some(value) = self.goal.constraint(&slot) {
            self.state
                .inform_slots
                .insert(slot.clone(), SlotValue::value(value));
            self.state.rest_slots.remove(&slot);
            self.state.request_slots.clear();
            self.state.current_intent = Intent::Inform;
        } else if self.goal.is_target(&slot) && !self.state.rest_slots.contains(&slot) {
            // Already answered: repeat what the agent told us.
            let answered = self
                .state
                .history_slots
                .get(&slot)
                .cloned()
                .unwrap_or(SlotValue::DontCare);
            self.state.inform_slots.insert(slot, answered);
            self.state.request_slots.clear();
            self.state.current_intent = Intent::Inform;
        } else if self.goal.is_target(&slot) {
            // Still wanted: ask back and volunteer every remaining constraint.
            self.state
                .request_slots
                .insert(slot.clone(), SlotValue::Unknown);
            for (constraint, value) in &self.goal.inform_constraints {
                if self.state.rest_slots.contains(constraint) {
                    self.state
                        .inform_slots
                        .insert(constraint.clone(), SlotValue::value(value.as_str()));
                }
            }
            let informed = &self.state.inform_slots;
            self.state.rest_slots.retain(|s| !informed.contains_key(s));
            self.state.current_intent = Intent::Request;
        } else {
            self.state.current_intent =
                if self.state.request_slots.is_empty() && self.state.rest_slots.is_empty() {
                    Intent::Thanks
                } else {
                    Intent::Inform
                };
            self.state.inform_slots.insert(slot, SlotValue::DontCare);
        }
    }

    fn response_confirm_answer<R: Rng>(&mut self, rng: &mut R) {
        match self.state.rest_slots.iter().choose(rng).cloned() {
            Some(slot) => self.reveal(&slot),
            None => self.state.current_intent = Intent::Thanks,
        }
    }

    fn response_multiple_choice<R: Rng>(&mut self, agent: &DialogAct, rng: &mut R) {
        let Some((slot, offered)) = agent.inform_slots.iter().next() else {
            self.response_confirm_answer(rng);
            return;
        };

        if let Some(value) = self.goal.constraint(slot) {
            self.state
                .inform_slots
                .insert(slot.clone(), SlotValue::value(value));
        } else if self.goal.is_target(slot) {
            let picked = offered
                .candidates()
                .choose(rng)
                .map(|choice| SlotValue::value(*choice))
                .unwrap_or_else(|| offered.clone());
            self.state.inform_slots.insert(slot.clone(), picked);
            self.state.request_slots.remove(slot);
            self.state.rest_slots.remove(slot);
        }
        self.state.current_intent = Intent::Inform;
    }

    fn response_closing(&mut self, agent: &DialogAct) {
        self.state.current_intent = Intent::Thanks;
        self.status = match self.config.success_criterion {
            SuccessCriterion::OnClosing => DialogueStatus::Success,
            SuccessCriterion::GoalCompletion if self.goal_completed(agent) => {
                DialogueStatus::Success
            }
            SuccessCriterion::GoalCompletion => DialogueStatus::Failure,
        };
    }

    fn goal_completed(&self, agent: &DialogAct) -> bool {
        let outstanding = self
            .state
            .request_slots
            .keys()
            .chain(self.state.rest_slots.iter())
            .any(|slot| !self.is_default(slot));
        if outstanding || self.constraint_violated {
            return false;
        }

        let history_ok = self.state.history_slots.iter().all(|(slot, value)| {
            *value != SlotValue::NoMatch
                && self
                    .goal
                    .constraint(slot)
                    .map(|expected| value.matches(expected))
                    .unwrap_or(true)
        });

        let default_ok = self
            .config
            .default_request_slot
            .as_ref()
            .and_then(|slot| agent.inform_slots.get(slot))
            .map(|value| *value != SlotValue::NoMatch)
            .unwrap_or(true);

        history_ok && default_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserSimulator;
    use dialogue_sim_config::{InitialIntentTemplate, UserKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn goals(goals: Vec<Goal>) -> GoalSet {
        GoalSet::new(goals).unwrap()
    }

    fn cheap_north() -> Goal {
        Goal::new().with_constraint("price", "cheap").with_target("area")
    }

    fn user(goal: Goal, config: UserConfig) -> RuleBasedUser {
        RuleBasedUser::new(goals(vec![goal]), config).unwrap()
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_reset_opens_with_constraint_and_request() {
        let mut user = user(cheap_north(), UserConfig::default());
        let act = user.reset(&mut rng());

        assert_eq!(act.intent, Intent::Request);
        assert_eq!(act.inform_slots.get("price"), Some(&SlotValue::value("cheap")));
        assert!(act.request_slots.contains("area"));
        assert_eq!(act.turn_number, 0);
        assert_eq!(user.turn(), 1);
        assert!(user.state().rest_slots.contains("area"));
        assert!(!user.state().rest_slots.contains("price"));
    }

    #[test]
    fn test_reset_without_targets_forces_inform() {
        let goal = Goal::new().with_constraint("price", "cheap");
        let mut user = user(goal, UserConfig::default());
        let act = user.reset(&mut rng());
        assert_eq!(act.intent, Intent::Inform);
        assert!(act.request_slots.is_empty());
    }

    #[test]
    fn test_mandatory_slots_always_revealed() {
        let goal = Goal::new()
            .with_constraint("price", "cheap")
            .with_constraint("area", "north")
            .with_constraint("food", "thai")
            .with_target("phone");
        let config = UserConfig {
            initial_intents: vec![InitialIntentTemplate::new(Intent::Request).with_mandatory("food")],
            ..UserConfig::default()
        };
        let mut user = user(goal, config);
        let mut rng = rng();

        for _ in 0..20 {
            let act = user.reset(&mut rng);
            assert_eq!(act.inform_slots.get("food"), Some(&SlotValue::value("thai")));
            assert!(!user.state().rest_slots.contains("food"));
        }
    }

    #[test]
    fn test_inform_answer_then_thanks() {
        let mut user = user(cheap_north(), UserConfig::default());
        let mut rng = rng();
        user.reset(&mut rng);

        let (act, status) = user.step(&DialogAct::agent("inform").with_inform("price", "cheap"), &mut rng);
        assert_eq!(act.intent, Intent::Request);
        assert!(act.request_slots.contains("area"));
        assert!(act.inform_slots.is_empty());
        assert_eq!(status, DialogueStatus::Ongoing);
        assert_eq!(act.turn_number, 2);
        assert_eq!(user.turn(), 3);

        let (act, _) = user.step(&DialogAct::agent("inform").with_inform("area", "north"), &mut rng);
        assert_eq!(act.intent, Intent::Thanks);
        assert!(user.state().request_slots.is_empty());
        assert!(user.state().rest_slots.is_empty());
        assert_eq!(
            user.state().history_slots.get("area"),
            Some(&SlotValue::value("north"))
        );

        let (act, status) = user.step(&DialogAct::agent("thanks"), &mut rng);
        assert_eq!(act.intent, Intent::Thanks);
        assert_eq!(status, DialogueStatus::Success);
    }

    #[test]
    fn test_wrong_value_is_corrected() {
        let mut user = user(cheap_north(), UserConfig::default());
        let mut rng = rng();
        user.reset(&mut rng);

        let (act, _) = user.step(
            &DialogAct::agent("inform").with_inform("price", "expensive"),
            &mut rng,
        );
        assert_eq!(act.intent, Intent::Inform);
        assert_eq!(act.inform_slots.get("price"), Some(&SlotValue::value("cheap")));
    }

    #[test]
    fn test_request_for_constraint_is_answered() {
        let goal = Goal::new()
            .with_constraint("price", "cheap")
            .with_constraint("area", "north")
            .with_target("phone");
        let mut user = user(goal, UserConfig::default());
        let mut rng = rng();
        user.reset(&mut rng);

        let (act, _) = user.step(&DialogAct::agent("request").with_request("area"), &mut rng);
        assert_eq!(act.intent, Intent::Inform);
        assert_eq!(act.inform_slots.get("area"), Some(&SlotValue::value("north")));
        assert!(act.request_slots.is_empty());
        assert!(!user.state().rest_slots.contains("area"));
    }

    #[test]
    fn test_request_outside_goal_is_dont_care() {
        let mut user = user(cheap_north(), UserConfig::default());
        let mut rng = rng();
        user.reset(&mut rng);

        let (act, _) = user.step(&DialogAct::agent("request").with_request("food"), &mut rng);
        assert_eq!(act.intent, Intent::Inform);
        assert_eq!(act.inform_slots.get("food"), Some(&SlotValue::DontCare));
    }

    #[test]
    fn test_request_for_pending_target_volunteers_constraints() {
        let goal = Goal::new()
            .with_constraint("price", "cheap")
            .with_constraint("area", "north")
            .with_target("phone");
        let mut user = user(goal, UserConfig::default());
        let mut rng = rng();
        user.reset(&mut rng);

        let (act, _) = user.step(&DialogAct::agent("request").with_request("phone"), &mut rng);
        assert_eq!(act.intent, Intent::Request);
        assert!(act.request_slots.contains("phone"));
        assert_eq!(act.inform_slots.len(), 1);
        assert!(user.state().rest_slots.iter().all(|s| s == "phone"));
    }

    #[test]
    fn test_task_complete_with_violated_constraint_is_denied() {
        let mut user = user(cheap_north(), UserConfig::default());
        let mut rng = rng();
        user.reset(&mut rng);

        let agent = DialogAct::agent("inform")
            .with_inform(TASK_COMPLETE_SLOT, "available")
            .with_inform("price", "expensive");
        let (act, status) = user.step(&agent, &mut rng);
        assert_eq!(act.intent, Intent::Deny);
        assert!(act.inform_slots.is_empty());
        assert!(act.request_slots.is_empty());
        assert_eq!(status, DialogueStatus::Ongoing);
    }

    #[test]
    fn test_task_complete_matching_goal_is_thanked() {
        let mut user = user(cheap_north(), UserConfig::default());
        let mut rng = rng();
        user.reset(&mut rng);

        let agent = DialogAct::agent("inform")
            .with_inform(TASK_COMPLETE_SLOT, "available")
            .with_inform("price", "Cheap");
        let (act, _) = user.step(&agent, &mut rng);
        assert_eq!(act.intent, Intent::Thanks);
    }

    #[test]
    fn test_goal_completion_criterion() {
        let config = UserConfig {
            success_criterion: SuccessCriterion::GoalCompletion,
            ..UserConfig::default()
        };

        let mut early = user(cheap_north(), config.clone());
        let mut rng = rng();
        early.reset(&mut rng);
        let (_, status) = early.step(&DialogAct::agent("thanks"), &mut rng);
        assert_eq!(status, DialogueStatus::Failure);

        let mut served = user(cheap_north(), config);
        served.reset(&mut rng);
        served.step(&DialogAct::agent("inform").with_inform("price", "cheap"), &mut rng);
        served.step(&DialogAct::agent("inform").with_inform("area", "north"), &mut rng);
        let (_, status) = served.step(&DialogAct::agent("closing"), &mut rng);
        assert_eq!(status, DialogueStatus::Success);
    }

    #[test]
    fn test_unhandled_intent_leaves_state_unchanged() {
        let mut user = user(cheap_north(), UserConfig::default());
        let mut rng = rng();
        let opening = user.reset(&mut rng);
        let before = user.state().clone();

        let (act, status) = user.step(&DialogAct::agent("greeting"), &mut rng);
        assert_eq!(user.state(), &before);
        assert_eq!(status, DialogueStatus::Ongoing);
        assert_eq!(act.intent, opening.intent);
        assert_eq!(user.turn(), 3);
    }

    #[test]
    fn test_multiple_choice_picks_offered_candidate() {
        let mut user = user(cheap_north(), UserConfig::default());
        let mut rng = rng();
        user.reset(&mut rng);

        let agent = DialogAct::agent("multiple_choice").with_inform("area", "north|south");
        let (act, _) = user.step(&agent, &mut rng);
        assert_eq!(act.intent, Intent::Inform);
        let picked = act.inform_slots.get("area").and_then(SlotValue::as_value);
        assert!(matches!(picked, Some("north") | Some("south")));
        assert!(!user.state().request_slots.contains_key("area"));
    }

    #[test]
    fn test_default_request_slot() {
        let config = UserConfig {
            default_request_slot: Some("ticket".to_string()),
            ..UserConfig::default()
        };

        let mut with_target = user(cheap_north(), config.clone());
        let act = with_target.reset(&mut rng());
        assert!(act.request_slots.contains("area"));
        assert!(!act.request_slots.contains("ticket"));
        assert!(with_target.goal().is_target("ticket"));

        let mut without_target = user(Goal::new().with_constraint("price", "cheap"), config);
        let act = without_target.reset(&mut rng());
        assert_eq!(act.intent, Intent::Request);
        assert!(act.request_slots.contains("ticket"));
    }

    #[test]
    fn test_turn_counter_steps_by_two() {
        let mut user = user(cheap_north(), UserConfig::default());
        let mut rng = rng();
        user.reset(&mut rng);
        let mut previous = user.turn();
        for _ in 0..5 {
            user.step(&DialogAct::agent("confirm_answer"), &mut rng);
            assert_eq!(user.turn(), previous + 2);
            previous = user.turn();
        }
    }

    #[test]
    fn test_model_based_user_unsupported() {
        let result = UserSimulator::from_config(
            UserKind::ModelBased,
            &UserConfig::default(),
            goals(vec![cheap_north()]),
        );
        assert!(matches!(
            result,
            Err(crate::SimError::Config(ConfigError::Unsupported(_)))
        ));
    }

    #[test]
    fn test_empty_initial_intents_rejected() {
        let config = UserConfig {
            initial_intents: Vec::new(),
            ..UserConfig::default()
        };
        assert!(RuleBasedUser::new(goals(vec![cheap_north()]), config).is_err());
    }
}
