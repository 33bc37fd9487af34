//! Day and week views over a task list, and the plain-text daily briefing
//! used for read-back.

use std::cmp::Ordering;

use chrono::{Datelike, Duration, NaiveDate, Timelike};

use crate::models::{parse_time, Frequency, Task};

/// Whether `task` falls on `date`, taking its recurrence into account.
///
/// Recurring tasks repeat from their own date onwards. Monthly tasks
/// repeat on the same day of the month, so a task on the 31st skips
/// shorter months.
pub fn occurs_on(task: &Task, date: NaiveDate) -> bool {
    let Some(start) = task.calendar_date() else {
        return false;
    };
    if date < start {
        return false;
    }
    match task.frequency {
        Frequency::None => date == start,
        Frequency::Daily => true,
        Frequency::Weekly => date.weekday() == start.weekday(),
        Frequency::Monthly => date.day() == start.day(),
    }
}

fn by_start_time(a: &&Task, b: &&Task) -> Ordering {
    match (a.start_time(), b.start_time()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.title.cmp(&b.title))
}

/// Tasks occurring on `date`, earliest start first
pub fn agenda_for(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    let mut agenda: Vec<&Task> = tasks.iter().filter(|t| occurs_on(t, date)).collect();
    agenda.sort_by(by_start_time);
    agenda
}

/// Monday-to-Sunday agenda for the week containing `day`
pub fn week_of(tasks: &[Task], day: NaiveDate) -> Vec<(NaiveDate, Vec<&Task>)> {
    let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    (0..7)
        .map(|offset| {
            let date = monday + Duration::days(offset);
            (date, agenda_for(tasks, date))
        })
        .collect()
}

/// Spoken form of an `HH:mm` time: "9 in the morning", "6:30 in the evening",
/// "noon", "midnight". Unparsable input is returned unchanged.
pub fn format_time_for_speech(time: &str) -> String {
    let Some(parsed) = parse_time(time) else {
        return time.to_string();
    };
    let (h, m) = (parsed.hour(), parsed.minute());

    match (h, m) {
        (0, 0) => return "midnight".to_string(),
        (12, 0) => return "noon".to_string(),
        _ => {}
    }

    let hour12 = match h % 12 {
        0 => 12,
        other => other,
    };
    let period = match h {
        0..=11 => "in the morning",
        12..=17 => "in the afternoon",
        _ => "in the evening",
    };

    if m == 0 {
        format!("{} {}", hour12, period)
    } else {
        format!("{}:{:02} {}", hour12, m, period)
    }
}

/// "19 October"
pub fn format_date_for_speech(date: NaiveDate) -> String {
    date.format("%-d %B").to_string()
}

/// Plain-text schedule for one day, suitable for text-to-speech
pub fn daily_briefing(tasks: &[Task], date: NaiveDate) -> String {
    let agenda = agenda_for(tasks, date);
    let day = format_date_for_speech(date);

    if agenda.is_empty() {
        return format!("No tasks for {}.", day);
    }

    let lines: Vec<String> = agenda
        .iter()
        .map(|task| {
            let mut line = String::new();
            if !task.time_start.trim().is_empty() {
                line.push_str(&format_time_for_speech(&task.time_start));
                line.push_str(" - ");
            }
            if task.title.trim().is_empty() {
                line.push_str("Untitled");
            } else {
                line.push_str(task.title.trim());
            }
            let location = task.location.trim();
            if !location.is_empty() {
                line.push_str(" at ");
                line.push_str(location);
            }
            line
        })
        .collect();

    format!("Tasks for {}: {}", day, lines.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(title: &str, day: &str, start: &str, frequency: Frequency) -> Task {
        let mut t = Task::new(title, 1, day);
        t.time_start = start.to_string();
        t.frequency = frequency;
        t
    }

    #[test]
    fn test_occurs_on_recurrence() {
        // 2026-10-19 is a Monday
        let once = task("Once", "2026-10-19", "09:00", Frequency::None);
        assert!(occurs_on(&once, date(2026, 10, 19)));
        assert!(!occurs_on(&once, date(2026, 10, 20)));

        let daily = task("Daily", "2026-10-19", "09:00", Frequency::Daily);
        assert!(!occurs_on(&daily, date(2026, 10, 18)));
        assert!(occurs_on(&daily, date(2026, 12, 1)));

        let weekly = task("Weekly", "2026-10-19", "09:00", Frequency::Weekly);
        assert!(occurs_on(&weekly, date(2026, 10, 26)));
        assert!(!occurs_on(&weekly, date(2026, 10, 27)));

        let monthly = task("Monthly", "2026-10-31", "09:00", Frequency::Monthly);
        assert!(occurs_on(&monthly, date(2026, 12, 31)));
        assert!(!occurs_on(&monthly, date(2026, 11, 30)));
    }

    #[test]
    fn test_occurs_on_bad_date() {
        let broken = task("Broken", "19/10/2026", "09:00", Frequency::Daily);
        assert!(!occurs_on(&broken, date(2026, 10, 19)));
    }

    #[test]
    fn test_agenda_sorted_by_start() {
        let tasks = vec![
            task("Lunch", "2026-10-19", "12:00", Frequency::None),
            task("Standup", "2026-10-19", "09:00", Frequency::None),
            task("Unscheduled", "2026-10-19", "", Frequency::None),
            task("Tomorrow", "2026-10-20", "08:00", Frequency::None),
        ];
        let titles: Vec<&str> = agenda_for(&tasks, date(2026, 10, 19))
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Standup", "Lunch", "Unscheduled"]);
    }

    #[test]
    fn test_week_of_starts_monday() {
        let tasks = vec![task("Gym", "2026-10-21", "18:00", Frequency::None)];
        let week = week_of(&tasks, date(2026, 10, 23));
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].0, date(2026, 10, 19));
        assert_eq!(week[6].0, date(2026, 10, 25));
        assert_eq!(week[2].1.len(), 1);
        assert!(week[0].1.is_empty());
    }

    #[test]
    fn test_format_time_for_speech() {
        assert_eq!(format_time_for_speech("00:00"), "midnight");
        assert_eq!(format_time_for_speech("12:00"), "noon");
        assert_eq!(format_time_for_speech("09:00"), "9 in the morning");
        assert_eq!(format_time_for_speech("00:15"), "12:15 in the morning");
        assert_eq!(format_time_for_speech("13:05:00"), "1:05 in the afternoon");
        assert_eq!(format_time_for_speech("18:30"), "6:30 in the evening");
        assert_eq!(format_time_for_speech("soon"), "soon");
    }

    #[test]
    fn test_daily_briefing() {
        let mut standup = task("Standup", "2026-10-19", "09:00", Frequency::None);
        standup.location = "Office".to_string();
        let lunch = task("Lunch", "2026-10-19", "12:00", Frequency::None);
        let tasks = vec![lunch, standup];

        assert_eq!(
            daily_briefing(&tasks, date(2026, 10, 19)),
            "Tasks for 19 October: 9 in the morning - Standup at Office. noon - Lunch"
        );
        assert_eq!(
            daily_briefing(&tasks, date(2026, 10, 20)),
            "No tasks for 20 October."
        );
    }
}
