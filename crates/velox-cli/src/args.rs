//! Command-line parsing.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use velox_core::models::{parse_date, parse_time, Frequency, Task};

pub const USAGE: &str = "\
Usage: velox <command> [args]

Account:
  signup <email>            Register a new account
  signin <email>            Sign in and store the session tokens
  signout                   Forget the stored tokens
  status                    Check whether the stored session is still valid

Tasks:
  tasks                     List all tasks
  task <id>                 Show one task
  add [task flags]          Create a task (needs --title, --category, --date)
  edit <id> [task flags]    Change fields of an existing task
  delete <id>               Delete a task
  capture <text>            Turn a sentence into a task and save it
  categories                List categories
  schedule [YYYY-MM-DD]     Agenda for a day (default today)
  week [YYYY-MM-DD]         Agenda for the week containing a day
  briefing [YYYY-MM-DD]     Read-back text for a day (default today)
  stats                     Task statistics

Task flags:
  --title <text>  --category <id>  --date <YYYY-MM-DD>
  --start <HH:mm> --end <HH:mm>    --location <text>  --notes <text>
  --frequency <none|daily|weekly|monthly>  --reminder | --no-reminder
";

#[derive(Debug, PartialEq)]
pub enum Command {
    SignUp { email: String },
    SignIn { email: String },
    SignOut,
    Status,
    Tasks,
    Task { id: i64 },
    Add(TaskFlags),
    Edit { id: i64, flags: TaskFlags },
    Delete { id: i64 },
    Capture { text: String },
    Categories,
    Schedule { date: Option<NaiveDate> },
    Week { date: Option<NaiveDate> },
    Briefing { date: Option<NaiveDate> },
    Stats,
    Help,
}

/// Task fields given on the command line; unset flags leave a field alone
#[derive(Debug, Default, PartialEq)]
pub struct TaskFlags {
    pub title: Option<String>,
    pub category: Option<i64>,
    pub date: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub frequency: Option<Frequency>,
    pub reminder: Option<bool>,
}

impl TaskFlags {
    pub fn apply(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(category) = self.category {
            task.category_id = category;
        }
        if let Some(ref date) = self.date {
            task.date = date.clone();
        }
        if let Some(ref start) = self.start {
            task.time_start = start.clone();
        }
        if let Some(ref end) = self.end {
            task.time_end = end.clone();
        }
        if let Some(ref location) = self.location {
            task.location = location.clone();
        }
        if let Some(ref notes) = self.notes {
            task.notes = notes.clone();
        }
        if let Some(frequency) = self.frequency {
            task.frequency = frequency;
        }
        if let Some(reminder) = self.reminder {
            task.has_reminder = reminder;
        }
    }

    pub fn new_task(&self) -> Result<Task> {
        let title = self.title.clone().ok_or_else(|| anyhow!("--title is required"))?;
        let category = self.category.ok_or_else(|| anyhow!("--category is required"))?;
        let date = self.date.clone().ok_or_else(|| anyhow!("--date is required"))?;

        let mut task = Task::new(title, category, date);
        self.apply(&mut task);
        Ok(task)
    }
}

fn id_arg(args: &[String], command: &str) -> Result<i64> {
    let raw = args
        .first()
        .ok_or_else(|| anyhow!("`{}` needs a task id", command))?;
    raw.parse()
        .with_context(|| format!("Invalid task id '{}'", raw))
}

fn email_arg(args: &[String], command: &str) -> Result<String> {
    args.first()
        .cloned()
        .ok_or_else(|| anyhow!("`{}` needs an email address", command))
}

fn date_arg(args: &[String]) -> Result<Option<NaiveDate>> {
    match args.first() {
        None => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| anyhow!("Invalid date '{}', expected YYYY-MM-DD", raw)),
    }
}

/// Normalize a time flag to `HH:mm`
fn time_flag(raw: &str, flag: &str) -> Result<String> {
    parse_time(raw)
        .map(|t| t.format("%H:%M").to_string())
        .ok_or_else(|| anyhow!("Invalid {} '{}', expected HH:mm", flag, raw))
}

fn parse_task_flags(args: &[String]) -> Result<TaskFlags> {
    let mut flags = TaskFlags::default();
    let mut iter = args.iter();

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--reminder" => {
                flags.reminder = Some(true);
                continue;
            }
            "--no-reminder" => {
                flags.reminder = Some(false);
                continue;
            }
            _ => {}
        }

        let value = iter
            .next()
            .ok_or_else(|| anyhow!("{} needs a value", flag))?;
        match flag.as_str() {
            "--title" => flags.title = Some(value.clone()),
            "--category" => {
                flags.category = Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid category id '{}'", value))?,
                )
            }
            "--date" => {
                if parse_date(value).is_none() {
                    bail!("Invalid --date '{}', expected YYYY-MM-DD", value);
                }
                flags.date = Some(value.clone());
            }
            "--start" => flags.start = Some(time_flag(value, "--start")?),
            "--end" => flags.end = Some(time_flag(value, "--end")?),
            "--location" => flags.location = Some(value.clone()),
            "--notes" => flags.notes = Some(value.clone()),
            "--frequency" => flags.frequency = Some(value.parse().map_err(|e: String| anyhow!(e))?),
            other => bail!("Unknown flag '{}'", other),
        }
    }

    Ok(flags)
}

/// Parse the arguments after the program name
pub fn parse(args: &[String]) -> Result<Command> {
    let Some((name, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    let command = match name.as_str() {
        "signup" => Command::SignUp { email: email_arg(rest, "signup")? },
        "signin" => Command::SignIn { email: email_arg(rest, "signin")? },
        "signout" => Command::SignOut,
        "status" => Command::Status,
        "tasks" => Command::Tasks,
        "task" => Command::Task { id: id_arg(rest, "task")? },
        "add" => Command::Add(parse_task_flags(rest)?),
        "edit" => Command::Edit {
            id: id_arg(rest, "edit")?,
            flags: parse_task_flags(&rest[1..])?,
        },
        "delete" => Command::Delete { id: id_arg(rest, "delete")? },
        "capture" => {
            if rest.is_empty() {
                bail!("`capture` needs the text to turn into a task");
            }
            Command::Capture { text: rest.join(" ") }
        }
        "categories" => Command::Categories,
        "schedule" => Command::Schedule { date: date_arg(rest)? },
        "week" => Command::Week { date: date_arg(rest)? },
        "briefing" => Command::Briefing { date: date_arg(rest)? },
        "stats" => Command::Stats,
        "help" | "--help" | "-h" => Command::Help,
        other => bail!("Unknown command '{}'. Run `velox help` for usage.", other),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse(&[]).unwrap(), Command::Help);
        assert_eq!(parse(&args("status")).unwrap(), Command::Status);
        assert_eq!(parse(&args("delete 12")).unwrap(), Command::Delete { id: 12 });
        assert_eq!(
            parse(&args("signin me@example.com")).unwrap(),
            Command::SignIn { email: "me@example.com".to_string() }
        );
        assert!(parse(&args("delete twelve")).is_err());
        assert_eq!(
            parse(&args("capture gym on friday at 7")).unwrap(),
            Command::Capture { text: "gym on friday at 7".to_string() }
        );
        assert!(parse(&args("capture")).is_err());
        assert!(parse(&args("frobnicate")).is_err());
    }

    #[test]
    fn test_parse_schedule_date() {
        assert_eq!(parse(&args("schedule")).unwrap(), Command::Schedule { date: None });
        assert_eq!(
            parse(&args("briefing 2026-10-19")).unwrap(),
            Command::Briefing { date: NaiveDate::from_ymd_opt(2026, 10, 19) }
        );
        assert!(parse(&args("schedule 19.10.2026")).is_err());
        assert_eq!(
            parse(&args("week 2026-10-21")).unwrap(),
            Command::Week { date: NaiveDate::from_ymd_opt(2026, 10, 21) }
        );
    }

    #[test]
    fn test_parse_add_flags() {
        let command = parse(&args(
            "add --title Gym --category 3 --date 2026-10-19 --start 9:05 --end 10:00:00 --frequency WEEKLY --reminder",
        ))
        .unwrap();
        let Command::Add(flags) = command else {
            panic!("expected add command");
        };
        let task = flags.new_task().unwrap();
        assert_eq!(task.title, "Gym");
        assert_eq!(task.category_id, 3);
        assert_eq!(task.time_start, "09:05");
        assert_eq!(task.time_end, "10:00");
        assert_eq!(task.frequency, Frequency::Weekly);
        assert!(task.has_reminder);
        assert!(task.id.is_none());
    }

    #[test]
    fn test_add_requires_core_fields() {
        let Command::Add(flags) = parse(&args("add --title Gym")).unwrap() else {
            panic!("expected add command");
        };
        assert!(flags.new_task().is_err());
    }

    #[test]
    fn test_edit_applies_only_given_flags() {
        let Command::Edit { id, flags } = parse(&args("edit 4 --notes bring --no-reminder")).unwrap()
        else {
            panic!("expected edit command");
        };
        assert_eq!(id, 4);

        let mut task = Task::new("Gym", 3, "2026-10-19");
        task.has_reminder = true;
        flags.apply(&mut task);
        assert_eq!(task.title, "Gym");
        assert_eq!(task.notes, "bring");
        assert!(!task.has_reminder);
    }

    #[test]
    fn test_bad_flag_values() {
        assert!(parse(&args("add --start 25:00")).is_err());
        assert!(parse(&args("add --frequency yearly")).is_err());
        assert!(parse(&args("add --title")).is_err());
        assert!(parse(&args("add --color red")).is_err());
    }
}
