//! Subscription snapshot: plan, start date and the plan-change flag

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Plan;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub is_subscribed: bool,
    pub plan: Option<Plan>,
    pub start_date: Option<DateTime<Utc>>,
    pub is_changing_plan: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionAction {
    Subscribed,
    Unsubscribed,
    SetPlan(Plan),
    SetStartDate(DateTime<Utc>),
    ChangingPlan,
    NotChangingPlan,
}

impl SubscriptionState {
    pub fn reduce(&mut self, action: &SubscriptionAction) {
        match action {
            SubscriptionAction::Subscribed => self.is_subscribed = true,
            SubscriptionAction::Unsubscribed => self.is_subscribed = false,
            SubscriptionAction::SetPlan(plan) => self.plan = Some(plan.clone()),
            SubscriptionAction::SetStartDate(date) => self.start_date = Some(*date),
            SubscriptionAction::ChangingPlan => self.is_changing_plan = true,
            SubscriptionAction::NotChangingPlan => self.is_changing_plan = false,
        }
    }

    /// "Member since" line for the account page
    pub fn member_since(&self) -> Option<String> {
        self.start_date
            .map(|d| d.format("%a %b %d %Y %H:%M:%S").to_string())
    }
}
