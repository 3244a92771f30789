//! Plan selector shown to unsubscribed users and when changing plan

use chrono::Utc;
use tracing::info;

use crate::auth::AuthError;
use crate::models::{subs_plans, Plan, User};
use crate::store::{Store, SubscriptionAction};
use crate::validation::FieldError;

use super::FormError;

#[derive(Debug, Clone, PartialEq)]
pub struct PlanSelector {
    pub plans: Vec<Plan>,
    /// Highlighted column
    pub cursor: usize,
    /// Chosen plan, if any
    pub selected: Option<usize>,
    pub error: Option<FormError>,
}

impl Default for PlanSelector {
    fn default() -> Self {
        Self {
            plans: subs_plans(),
            cursor: 0,
            selected: None,
            error: None,
        }
    }
}

impl PlanSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor + 1 < self.plans.len() {
            self.cursor += 1;
        }
    }

    /// Choose the highlighted plan
    pub fn choose(&mut self) {
        self.selected = Some(self.cursor);
        self.error = None;
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        self.selected.and_then(|i| self.plans.get(i))
    }

    /// Submit stays disabled until a plan is chosen
    pub fn can_submit(&self) -> bool {
        self.selected_plan().is_some()
    }

    pub fn button_label(is_changing_plan: bool) -> &'static str {
        if is_changing_plan {
            "Change plan"
        } else {
            "Subscribe"
        }
    }

    /// Subscribe the signed-in user to the chosen plan, starting now
    pub fn submit(&mut self, user: Option<&User>, store: &mut Store) -> Result<(), FormError> {
        let outcome = self.apply(user, store);
        self.error = outcome.clone().err();
        outcome
    }

    /// Abandon a plan change
    pub fn cancel(&mut self, store: &mut Store) {
        self.selected = None;
        self.error = None;
        store.dispatch(SubscriptionAction::NotChangingPlan);
    }

    fn apply(&self, user: Option<&User>, store: &mut Store) -> Result<(), FormError> {
        let Some(user) = user else {
            return Err(FormError::alert(&AuthError::NotSignedIn));
        };
        let plan = self
            .selected_plan()
            .cloned()
            .ok_or(FieldError::NoPlanSelected)?;

        if store.state().subscription.is_changing_plan {
            store.dispatch(SubscriptionAction::NotChangingPlan);
        }
        info!(uid = %user.uid, plan = %plan.id, "subscribing");
        store.dispatch(SubscriptionAction::SetPlan(plan));
        store.dispatch(SubscriptionAction::SetStartDate(Utc::now()));
        store.dispatch(SubscriptionAction::Subscribed);
        Ok(())
    }
}
