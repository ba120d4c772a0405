// Request schemas for the proxied endpoints

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use super::schema::{Field, FieldViolation, Schema};
use crate::models::{grade_for, quote, BillingCycle, Plan};

pub const GENDERS: &[&str] = &["male", "female"];
pub const TERM_NAMES: &[&str] = &["first", "second", "third"];
pub const RECIPIENT_GROUPS: &[&str] = &["admins", "teachers", "students", "parents"];
pub const THEME_MODES: &[&str] = &["light", "dark", "system"];

/// Continuous assessment and exam ceilings; together they make 100
pub const MAX_CA_SCORE: f64 = 40.0;
pub const MAX_EXAM_SCORE: f64 = 60.0;

pub static LOGIN: Lazy<Schema> = Lazy::new(|| {
    Schema::new("login")
        .field(Field::string("email").email())
        .field(Field::string("password").min_len(6))
});

pub static SCHOOL_REGISTRATION: Lazy<Schema> = Lazy::new(|| {
    Schema::new("school_registration")
        .field(Field::string("school_name").min_len(3).max_len(120))
        .field(Field::string("school_email").email())
        .field(Field::string("phone").phone())
        .field(Field::string("address").min_len(5))
        .field(Field::string("admin_first_name").min_len(2))
        .field(Field::string("admin_last_name").min_len(2))
        .field(Field::string("admin_email").email())
        .field(Field::string("password").min_len(8))
        .field(Field::string("logo_url").url().optional())
});

pub static SCHOOL_UPDATE: Lazy<Schema> = Lazy::new(|| {
    Schema::new("school_update")
        .field(Field::string("school_name").min_len(3).max_len(120))
        .field(Field::string("school_email").email())
        .field(Field::string("phone").phone())
        .field(Field::string("address").min_len(5))
        .field(Field::string("motto").max_len(200))
        .field(Field::string("logo_url").url())
        .partial()
});

pub static TEACHER: Lazy<Schema> = Lazy::new(|| {
    Schema::new("teacher")
        .field(Field::string("first_name").min_len(2))
        .field(Field::string("last_name").min_len(2))
        .field(Field::string("email").email())
        .field(Field::string("phone").phone())
        .field(Field::string("gender").one_of(GENDERS))
        .field(Field::string_list("subject_ids").optional())
        .field(Field::string_list("class_ids").optional())
});

pub static TEACHER_UPDATE: Lazy<Schema> = Lazy::new(|| TEACHER.partial());

pub static STUDENT: Lazy<Schema> = Lazy::new(|| {
    Schema::new("student")
        .field(Field::string("first_name").min_len(2))
        .field(Field::string("last_name").min_len(2))
        .field(Field::string("gender").one_of(GENDERS))
        .field(Field::string("date_of_birth").date())
        .field(Field::string("class_id"))
        .field(Field::string("admission_number").optional())
        .field(Field::string("guardian_name").min_len(2).optional())
        .field(Field::string("guardian_phone").phone().optional())
        .field(Field::string("guardian_email").email().optional())
});

pub static STUDENT_UPDATE: Lazy<Schema> = Lazy::new(|| STUDENT.partial());

pub static ACADEMIC_SESSION: Lazy<Schema> = Lazy::new(|| {
    Schema::new("academic_session")
        .field(Field::string("name"))
        .field(Field::string("start_date").date())
        .field(Field::string("end_date").date())
        .transform(check_session)
});

pub static TERM: Lazy<Schema> = Lazy::new(|| {
    Schema::new("term")
        .field(Field::string("name").one_of(TERM_NAMES))
        .field(Field::string("start_date").date())
        .field(Field::string("end_date").date())
        .transform(check_date_range)
});

pub static SUBJECT: Lazy<Schema> = Lazy::new(|| {
    Schema::new("subject")
        .field(Field::string("name").min_len(2).max_len(80))
        .field(Field::string("code").max_len(12).optional())
});

pub static CLASS: Lazy<Schema> = Lazy::new(|| {
    Schema::new("class")
        .field(Field::string("name").min_len(2).max_len(40))
        .field(Field::string("arm").max_len(10).optional())
        .field(Field::string("form_teacher_id").optional())
});

pub static SCORE: Lazy<Schema> = Lazy::new(|| {
    Schema::new("score")
        .field(Field::string("student_id"))
        .field(Field::string("subject_id"))
        .field(Field::string("session_id"))
        .field(Field::string("term_id"))
        .field(Field::number("ca_score").min(0.0).max(MAX_CA_SCORE))
        .field(Field::number("exam_score").min(0.0).max(MAX_EXAM_SCORE))
        .transform(grade_score)
});

pub static MESSAGE: Lazy<Schema> = Lazy::new(|| {
    Schema::new("message")
        .field(Field::string("title").min_len(3).max_len(150))
        .field(Field::string("body").min_len(1).max_len(5000))
        .field(Field::flags("recipient_groups").one_of(RECIPIENT_GROUPS))
        .transform(fold_recipients)
});

pub static PROFILE: Lazy<Schema> = Lazy::new(|| {
    Schema::new("profile")
        .field(Field::string("first_name").min_len(2))
        .field(Field::string("last_name").min_len(2))
        .field(Field::string("phone").phone())
        .field(Field::string("avatar_url").url())
        .field(Field::string("bio").max_len(500))
        .partial()
});

pub static THEME: Lazy<Schema> = Lazy::new(|| {
    Schema::new("theme")
        .field(Field::string("primary_color").hex_color())
        .field(Field::string("secondary_color").hex_color())
        .field(Field::string("accent_color").hex_color().optional())
        .field(Field::string("mode").one_of(THEME_MODES).optional())
});

pub static SUBSCRIPTION: Lazy<Schema> = Lazy::new(|| {
    Schema::new("subscription")
        .field(Field::string("plan").one_of(Plan::NAMES))
        .field(Field::integer("student_count").min(1.0))
        .field(Field::string("billing_cycle").one_of(BillingCycle::NAMES))
        .transform(price_subscription)
});

fn date_field(envelope: &Map<String, Value>, name: &str) -> Option<NaiveDate> {
    envelope
        .get(name)
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// `end_date` must fall after `start_date` when both are present
fn check_date_range(envelope: Map<String, Value>) -> Result<Map<String, Value>, Vec<FieldViolation>> {
    if let (Some(start), Some(end)) = (
        date_field(&envelope, "start_date"),
        date_field(&envelope, "end_date"),
    ) {
        if end <= start {
            return Err(vec![FieldViolation::new(
                "end_date",
                "end_date must be after start_date",
            )]);
        }
    }
    Ok(envelope)
}

fn is_year(part: &str) -> bool {
    part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit())
}

/// Session names look like `2024/2025`, with consecutive years
fn check_session(envelope: Map<String, Value>) -> Result<Map<String, Value>, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    if let Some(name) = envelope.get("name").and_then(Value::as_str) {
        let years = name
            .split_once('/')
            .filter(|(a, b)| is_year(a) && is_year(b))
            .and_then(|(a, b)| Some((a.parse::<u32>().ok()?, b.parse::<u32>().ok()?)));
        match years {
            Some((first, second)) if first.checked_add(1) == Some(second) => {}
            _ => violations.push(FieldViolation::new(
                "name",
                "name must be a session like 2024/2025",
            )),
        }
    }

    match check_date_range(envelope) {
        Ok(envelope) if violations.is_empty() => Ok(envelope),
        Ok(_) => Err(violations),
        Err(mut range) => {
            violations.append(&mut range);
            Err(violations)
        }
    }
}

/// Replace the per-group selection map with the flat list of selected groups
fn fold_recipients(
    mut envelope: Map<String, Value>,
) -> Result<Map<String, Value>, Vec<FieldViolation>> {
    let selected = match envelope.remove("recipient_groups") {
        Some(Value::Object(groups)) => {
            let mut selected: Vec<String> = groups
                .into_iter()
                .filter(|(_, on)| on.as_bool() == Some(true))
                .map(|(group, _)| group)
                .collect();
            selected.sort();
            selected
        }
        _ => Vec::new(),
    };

    if selected.is_empty() {
        return Err(vec![FieldViolation::new(
            "recipient_groups",
            "select at least one recipient group",
        )]);
    }

    envelope.insert(
        "recipients".to_string(),
        Value::Array(selected.into_iter().map(Value::String).collect()),
    );
    Ok(envelope)
}

/// Attach `total` and `grade` derived from the two score components
fn grade_score(mut envelope: Map<String, Value>) -> Result<Map<String, Value>, Vec<FieldViolation>> {
    let component = |name: &str| envelope.get(name).and_then(Value::as_f64).unwrap_or(0.0);
    let total = component("ca_score") + component("exam_score");
    let grade = grade_for(total);

    let total = serde_json::Number::from_f64(total).ok_or_else(|| {
        vec![FieldViolation::new("exam_score", "score total is not a number")]
    })?;
    envelope.insert("total".to_string(), Value::Number(total));
    envelope.insert("grade".to_string(), Value::String(grade.to_string()));
    envelope.insert("remark".to_string(), Value::String(grade.remark().to_string()));
    Ok(envelope)
}

/// Attach the `amount` due for the chosen plan
fn price_subscription(
    mut envelope: Map<String, Value>,
) -> Result<Map<String, Value>, Vec<FieldViolation>> {
    let plan = envelope
        .get("plan")
        .and_then(Value::as_str)
        .and_then(Plan::parse);
    let cycle = envelope
        .get("billing_cycle")
        .and_then(Value::as_str)
        .and_then(BillingCycle::parse);
    let students = envelope.get("student_count").and_then(Value::as_u64);

    let amount = match (plan, cycle, students) {
        (Some(plan), Some(cycle), Some(students)) => quote(plan, students, cycle),
        _ => None,
    }
    .ok_or_else(|| {
        vec![FieldViolation::new(
            "student_count",
            "student_count is out of range for this plan",
        )]
    })?;

    envelope.insert("amount".to_string(), Value::from(amount));
    Ok(envelope)
}
