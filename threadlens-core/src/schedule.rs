//! Automation schedule micro-DSL
//!
//! Bidirectional conversion between a restricted 5-field cron expression
//! (`minute hour day-of-month month day-of-week`) and the structured
//! [`ScheduleState`] the schedule editor manipulates, plus validation of
//! which cron shapes the editor can represent and next-run computation
//! honoring IANA timezones.
//!
//! Syntactic validation and occurrence iteration are delegated to the
//! `cron` crate. That crate wants a seconds field and numbers days of the
//! week 1–7 with Sunday = 1, while the classic crontab form stored by the
//! automation layer uses 5 fields and 0–6; [`normalize_for_parser`]
//! bridges the two before any expression reaches the parser.
//!
//! Everything here is pure and synchronous. Failures surface as values
//! ([`ScheduleError`], `None`, or a fixed fallback string), never as
//! panics.

use crate::error::ScheduleError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Most hour entries a multi-hour schedule may carry.
pub const MAX_HOURS_PER_SCHEDULE: usize = 8;

/// Highest day-of-month a monthly schedule may use. Days 29–31 are
/// rejected so a schedule never silently skips short months.
const MAX_DAY_OF_MONTH: u32 = 28;

// ============================================
// Schedule state
// ============================================

/// How often an automation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Weekdays,
    CustomWeekly,
    /// Development-only escape hatch; see [`generate_cron_with`].
    #[serde(rename = "5-minutely")]
    FiveMinutely,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Weekdays => "weekdays",
            Frequency::CustomWeekly => "custom-weekly",
            Frequency::FiveMinutely => "5-minutely",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "weekdays" => Ok(Frequency::Weekdays),
            "custom-weekly" => Ok(Frequency::CustomWeekly),
            "5-minutely" => Ok(Frequency::FiveMinutely),
            _ => Err(format!("unknown frequency: {}", s)),
        }
    }
}

/// Billing tier of the workspace editing a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    Free,
    Pro,
}

impl AccessTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessTier::Free => "free",
            AccessTier::Pro => "pro",
        }
    }
}

/// The schedule editor's structured view of a cron expression.
///
/// `hour` is a `"H:MM"` time-of-day string. Multi-hour schedules carry
/// every run time in `selected_hours` (all sharing one minute value) in
/// addition to the primary `hour`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleState {
    pub frequency: Frequency,
    pub hour: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_days: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_hours: Option<Vec<String>>,
}

impl Default for ScheduleState {
    /// The defensive fallback: daily at 9:00.
    fn default() -> Self {
        Self {
            frequency: Frequency::Daily,
            hour: "9:00".to_string(),
            day_of_week: None,
            day_of_month: None,
            selected_days: None,
            selected_hours: None,
        }
    }
}

// ============================================
// Validation
// ============================================

/// True iff `cron` is five whitespace-separated fields that a standard
/// cron parser accepts.
pub fn is_valid_cron_expression(cron: &str) -> bool {
    match normalize_for_parser(cron) {
        Some(normalized) => Schedule::from_str(&normalized).is_ok(),
        None => false,
    }
}

/// True iff `cron` is valid and within the subset the schedule editor can
/// represent and edit.
pub fn is_supported_cron_expression(cron: &str) -> bool {
    if !is_valid_cron_expression(cron) {
        return false;
    }
    let fields: Vec<&str> = cron.split_whitespace().collect();
    let (minute, hour, day_of_month, month, day_of_week) =
        (fields[0], fields[1], fields[2], fields[3], fields[4]);

    // Month-based schedules are not representable.
    if month != "*" {
        return false;
    }

    let five_minutely = minute == "*/5";
    if !five_minutely && parse_field_int(minute, 0, 59).is_none() {
        return false;
    }

    // A wildcard hour pairs only with the */5 development schedule.
    if hour == "*" {
        if !five_minutely {
            return false;
        }
    } else if !is_supported_hour_list(hour) {
        return false;
    }

    match (day_of_month, day_of_week) {
        ("*", "*") => true,
        ("*", dow) => is_supported_day_of_week(dow),
        (dom, "*") => parse_field_int(dom, 1, MAX_DAY_OF_MONTH).is_some(),
        // Restricting both day fields at once is not representable.
        _ => false,
    }
}

/// Full validation as surfaced to the schedule editor: syntax, supported
/// subset, and the tier gate on multi-hour schedules.
pub fn validate_cron_expression(cron: &str, tier: AccessTier) -> crate::error::Result<()> {
    if !is_valid_cron_expression(cron) {
        return Err(ScheduleError::InvalidSyntax);
    }
    if !is_supported_cron_expression(cron) {
        return Err(ScheduleError::UnsupportedPattern);
    }
    let hour = cron.split_whitespace().nth(1).unwrap_or("*");
    if hour.contains(',') && tier != AccessTier::Pro {
        return Err(ScheduleError::ProOnly);
    }
    Ok(())
}

/// A bare integer (digits only) within `[min, max]`.
fn parse_field_int(field: &str, min: u32, max: u32) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<u32>().ok().filter(|n| (min..=max).contains(n))
}

/// 1–8 distinct integer hours, comma-separated.
fn is_supported_hour_list(hour: &str) -> bool {
    let entries: Vec<&str> = hour.split(',').collect();
    if entries.is_empty() || entries.len() > MAX_HOURS_PER_SCHEDULE {
        return false;
    }
    let mut seen = HashSet::new();
    entries
        .iter()
        .all(|e| parse_field_int(e, 0, 23).is_some_and(|h| seen.insert(h)))
}

/// `1-5` (weekdays), a single digit 0–6, or a comma-separated list of
/// digits 0–6. Named days and other ranges are not representable.
fn is_supported_day_of_week(field: &str) -> bool {
    if field == "1-5" {
        return true;
    }
    field
        .split(',')
        .all(|d| d.len() == 1 && d.bytes().all(|b| (b'0'..=b'6').contains(&b)))
}

// ============================================
// Parsing and generation
// ============================================

/// Convert a stored cron expression to editor state.
///
/// Tolerant by design: any field-count or parse failure, including both
/// day fields restricted at once, falls back to the default daily-at-9:00
/// state rather than erroring. This is a defensive default for display,
/// not a validation.
pub fn parse_cron_to_state(cron: &str) -> ScheduleState {
    parse_cron_to_state_inner(cron).unwrap_or_default()
}

fn parse_cron_to_state_inner(cron: &str) -> Option<ScheduleState> {
    let fields: Vec<&str> = cron.split_whitespace().collect();
    if fields.len() != 5 {
        return None;
    }
    let (minute_field, hour_field, day_of_month, day_of_week) =
        (fields[0], fields[1], fields[2], fields[4]);

    if day_of_month != "*" && day_of_week != "*" {
        return None;
    }

    if minute_field == "*/5" {
        return Some(ScheduleState {
            frequency: Frequency::FiveMinutely,
            ..ScheduleState::default()
        });
    }

    let minute = if minute_field == "*" {
        0
    } else {
        parse_field_int(minute_field, 0, 59)?
    };

    let (primary_hour, selected_hours) = if hour_field == "*" {
        (9, None)
    } else if hour_field.contains(',') {
        let mut hours = Vec::new();
        for entry in hour_field.split(',') {
            hours.push(parse_field_int(entry, 0, 23)?);
        }
        let selected = hours
            .iter()
            .map(|h| format!("{}:{:02}", h, minute))
            .collect();
        (hours[0], Some(selected))
    } else {
        (parse_field_int(hour_field, 0, 23)?, None)
    };
    let hour = format!("{}:{:02}", primary_hour, minute);

    let mut state = ScheduleState {
        frequency: Frequency::Daily,
        hour,
        day_of_week: None,
        day_of_month: None,
        selected_days: None,
        selected_hours,
    };

    if day_of_month != "*" {
        state.frequency = Frequency::Monthly;
        state.day_of_month = Some(parse_field_int(day_of_month, 1, 31)?.to_string());
    } else if day_of_week != "*" {
        if day_of_week == "1-5" {
            state.frequency = Frequency::Weekdays;
            state.selected_days =
                Some(["1", "2", "3", "4", "5"].iter().map(|d| d.to_string()).collect());
        } else if day_of_week.len() == 1 && parse_field_int(day_of_week, 0, 6).is_some() {
            state.frequency = Frequency::Weekly;
            state.day_of_week = Some(day_of_week.to_string());
        } else if is_supported_day_of_week(day_of_week) {
            state.frequency = Frequency::CustomWeekly;
            state.selected_days =
                Some(day_of_week.split(',').map(|d| d.to_string()).collect());
        } else {
            return None;
        }
    }

    Some(state)
}

/// Convert editor state back to a cron expression, with development
/// frequencies disabled. See [`generate_cron_with`].
pub fn generate_cron(state: &ScheduleState) -> String {
    generate_cron_with(state, false)
}

/// Convert editor state back to a cron expression.
///
/// When `selected_hours` is non-empty, its first entry's minute component
/// overrides the minute of `hour` (multi-hour edits always originate
/// from the hour-list control), and the hour field is the comma-joined
/// hour components in the order given; the caller is responsible for
/// uniqueness.
///
/// `allow_dev_schedules` gates the `5-minutely` frequency; when the flag
/// is off that frequency falls through to daily handling.
pub fn generate_cron_with(state: &ScheduleState, allow_dev_schedules: bool) -> String {
    let (mut minute, mut hour_field) = split_time_of_day(&state.hour);

    if let Some(selected) = state.selected_hours.as_ref().filter(|v| !v.is_empty()) {
        let (first_minute, _) = split_time_of_day(&selected[0]);
        minute = first_minute;
        hour_field = selected
            .iter()
            .map(|entry| split_time_of_day(entry).1)
            .collect::<Vec<_>>()
            .join(",");
    }

    match state.frequency {
        Frequency::FiveMinutely if allow_dev_schedules => "*/5 * * * *".to_string(),
        Frequency::Daily | Frequency::FiveMinutely => {
            format!("{} {} * * *", minute, hour_field)
        }
        Frequency::Weekly => format!(
            "{} {} * * {}",
            minute,
            hour_field,
            state.day_of_week.as_deref().unwrap_or("1")
        ),
        Frequency::Monthly => format!(
            "{} {} {} * *",
            minute,
            hour_field,
            state.day_of_month.as_deref().unwrap_or("1")
        ),
        Frequency::Weekdays => format!("{} {} * * 1-5", minute, hour_field),
        Frequency::CustomWeekly => {
            let days = state
                .selected_days
                .as_ref()
                .filter(|d| !d.is_empty())
                .map(|d| d.join(","))
                .unwrap_or_else(|| "1".to_string());
            format!("{} {} * * {}", minute, hour_field, days)
        }
    }
}

/// Split an `"H:MM"` string into canonical (leading-zero-stripped)
/// minute and hour strings, defaulting to 9:00 on malformed input.
fn split_time_of_day(time: &str) -> (String, String) {
    let parsed = time.split_once(':').and_then(|(h, m)| {
        Some((parse_field_int(m, 0, 59)?, parse_field_int(h, 0, 23)?))
    });
    let (minute, hour) = parsed.unwrap_or((0, 9));
    (minute.to_string(), hour.to_string())
}

// ============================================
// Next-run computation
// ============================================

/// Inputs for [`next_run_time`].
#[derive(Debug, Clone)]
pub struct NextRunQuery<'a> {
    /// Stored 5-field cron expression.
    pub cron: &'a str,
    /// IANA timezone name the schedule is evaluated in; `None` means UTC.
    pub timezone: Option<&'a str>,
    /// Occurrences are strictly after this instant; `None` means now.
    pub after: Option<DateTime<Utc>>,
    /// Tier of the owning workspace, for the multi-hour gate.
    pub access_tier: AccessTier,
}

/// First occurrence of the schedule strictly after the query instant.
///
/// `None` when validation fails or the timezone name is unknown; this
/// function never panics on bad input.
pub fn next_run_time(query: &NextRunQuery) -> Option<DateTime<Utc>> {
    validate_cron_expression(query.cron, query.access_tier).ok()?;
    let schedule = Schedule::from_str(&normalize_for_parser(query.cron)?).ok()?;
    let after = query.after.unwrap_or_else(Utc::now);

    match query.timezone {
        Some(name) => {
            let tz: Tz = name.parse().ok()?;
            schedule
                .after(&after.with_timezone(&tz))
                .next()
                .map(|dt| dt.with_timezone(&Utc))
        }
        None => schedule.after(&after).next(),
    }
}

/// Rewrite a classic 5-field crontab expression into the form the `cron`
/// crate parses: a seconds field is prepended and the day-of-week field
/// is shifted from 0–6 (Sunday = 0, with 7 also accepted as Sunday) to
/// the crate's 1–7 (Sunday = 1) numbering.
fn normalize_for_parser(cron: &str) -> Option<String> {
    let fields: Vec<&str> = cron.split_whitespace().collect();
    if fields.len() != 5 {
        return None;
    }
    Some(format!(
        "0 {} {} {} {} {}",
        fields[0],
        fields[1],
        fields[2],
        fields[3],
        shift_day_of_week(fields[4])
    ))
}

fn shift_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(|term| {
            let (range, step) = match term.split_once('/') {
                Some((r, s)) => (r, Some(s)),
                None => (term, None),
            };
            let shifted = match range.split_once('-') {
                Some((a, b)) => match (shift_day_number(a), shift_day_number(b)) {
                    (Some(a), Some(b)) => format!("{}-{}", a, b),
                    _ => range.to_string(),
                },
                None => shift_day_number(range)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| range.to_string()),
            };
            match step {
                Some(step) => format!("{}/{}", shifted, step),
                None => shifted,
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn shift_day_number(token: &str) -> Option<u32> {
    parse_field_int(token, 0, 7).map(|n| (n % 7) + 1)
}

// ============================================
// Human-readable descriptions
// ============================================

const INVALID_CRON_DESCRIPTION: &str = "Invalid cron expression";

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Render a supported cron expression to English, e.g.
/// `"Every Monday at 9:00"`. Returns `"Invalid cron expression"` for
/// anything unsupported or unparseable, never an error.
pub fn cron_description(cron: &str) -> String {
    if !is_supported_cron_expression(cron) {
        return INVALID_CRON_DESCRIPTION.to_string();
    }
    let state = parse_cron_to_state(cron);

    if state.frequency == Frequency::FiveMinutely {
        return "Every 5 minutes".to_string();
    }

    let times = match &state.selected_hours {
        Some(hours) if !hours.is_empty() => join_listing(hours),
        _ => state.hour.clone(),
    };

    match state.frequency {
        Frequency::Daily => format!("Every day at {}", times),
        Frequency::Weekly => {
            let day = state
                .day_of_week
                .as_deref()
                .and_then(day_name)
                .unwrap_or("Monday");
            format!("Every {} at {}", day, times)
        }
        Frequency::Monthly => format!(
            "On day {} of every month at {}",
            state.day_of_month.as_deref().unwrap_or("1"),
            times
        ),
        Frequency::Weekdays => format!("Every weekday at {}", times),
        Frequency::CustomWeekly => {
            let days: Vec<String> = state
                .selected_days
                .as_deref()
                .unwrap_or_default()
                .iter()
                .filter_map(|d| day_name(d))
                .map(|d| d.to_string())
                .collect();
            format!("Every {} at {}", join_listing(&days), times)
        }
        Frequency::FiveMinutely => unreachable!("handled above"),
    }
}

fn day_name(digit: &str) -> Option<&'static str> {
    let idx: usize = digit.parse().ok()?;
    DAY_NAMES.get(idx).copied()
}

/// Join as an English listing: "a", "a and b", "a, b and c".
fn join_listing<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [rest @ .., last] => format!(
            "{} and {}",
            rest.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
            last.as_ref()
        ),
    }
}
