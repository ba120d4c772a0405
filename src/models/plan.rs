/// Terms in one academic session
pub const TERMS_PER_SESSION: u64 = 3;
/// Discount applied to a full-session subscription, in percent
pub const SESSION_DISCOUNT_PERCENT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Basic,
    Standard,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingCycle {
    Term,
    Session,
}

impl Plan {
    pub const NAMES: &'static [&'static str] = &["basic", "standard", "premium"];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "basic" => Some(Plan::Basic),
            "standard" => Some(Plan::Standard),
            "premium" => Some(Plan::Premium),
            _ => None,
        }
    }

    /// Price per student per term, in naira
    pub fn price_per_student(&self) -> u64 {
        match self {
            Plan::Basic => 500,
            Plan::Standard => 800,
            Plan::Premium => 1200,
        }
    }
}

impl BillingCycle {
    pub const NAMES: &'static [&'static str] = &["term", "session"];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "term" => Some(BillingCycle::Term),
            "session" => Some(BillingCycle::Session),
            _ => None,
        }
    }
}

/// Amount due for `students` on `plan` over one billing cycle.
///
/// Returns `None` for zero students or on overflow.
pub fn quote(plan: Plan, students: u64, cycle: BillingCycle) -> Option<u64> {
    if students == 0 {
        return None;
    }
    let per_term = plan.price_per_student().checked_mul(students)?;
    match cycle {
        BillingCycle::Term => Some(per_term),
        BillingCycle::Session => {
            let gross = per_term.checked_mul(TERMS_PER_SESSION)?;
            Some(gross.checked_mul(100 - SESSION_DISCOUNT_PERCENT)? / 100)
        }
    }
}
