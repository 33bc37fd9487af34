use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use futures::future::try_join;
use velox_core::models::{category_name, Category, Task};
use velox_core::schedule::{agenda_for, daily_briefing, week_of};
use velox_core::stats::TaskStatistics;
use velox_core::SessionClient;

use crate::args::Command;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn task_line(task: &Task, categories: &[Category]) -> String {
    let id = task.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    let reminder = if task.has_reminder { " [reminder]" } else { "" };
    format!(
        "{:>5}  {}  {:>5}-{:<5}  {}  ({}, {}){}",
        id,
        task.date,
        task.time_start,
        task.time_end,
        task.title,
        category_name(categories, task.category_id),
        task.frequency.display_name(),
        reminder
    )
}

fn print_task(task: &Task, categories: &[Category]) {
    match task.id {
        Some(id) => println!("Task {}", id),
        None => println!("New task"),
    }
    println!("  Title:     {}", task.title);
    println!("  Category:  {}", category_name(categories, task.category_id));
    println!("  Date:      {}", task.date);
    println!("  Time:      {} - {}", task.time_start, task.time_end);
    println!("  Repeats:   {}", task.frequency.display_name());
    println!("  Reminder:  {}", if task.has_reminder { "yes" } else { "no" });
    if !task.location.is_empty() {
        println!("  Location:  {}", task.location);
    }
    if !task.notes.is_empty() {
        println!("  Notes:     {}", task.notes);
    }
}

fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password")
}

pub async fn run(client: &SessionClient, command: Command) -> Result<()> {
    match command {
        Command::Help => print!("{}", crate::args::USAGE),

        Command::SignUp { email } => {
            let password = prompt_password("Password: ")?;
            let confirm = prompt_password("Repeat password: ")?;
            if password != confirm {
                bail!("Passwords do not match");
            }
            client.sign_up(&email, &password, &confirm).await?;
            println!("Activation link sent to {}.", email);
        }

        Command::SignIn { email } => {
            let password = prompt_password("Password: ")?;
            client.sign_in(&email, &password).await?;
            println!("Signed in as {}.", email);
        }

        Command::SignOut => {
            client.sign_out();
            println!("Signed out.");
        }

        Command::Status => {
            if client.check_session().await? {
                println!("Signed in ({}).", client.base_url());
            } else {
                println!("Not signed in. Run `velox signin <email>`.");
            }
        }

        Command::Tasks => {
            let (tasks, categories) =
                try_join(client.list_tasks(), client.list_categories()).await?;
            if tasks.is_empty() {
                println!("No tasks.");
            }
            for task in &tasks {
                println!("{}", task_line(task, &categories));
            }
        }

        Command::Task { id } => {
            let (task, categories) =
                try_join(client.get_task(id), client.list_categories()).await?;
            print_task(&task, &categories);
        }

        Command::Add(flags) => {
            let task = flags.new_task()?;
            let created = client.create_task(&task).await?;
            println!(
                "Created task {}.",
                created.id.map(|id| id.to_string()).unwrap_or_default()
            );
        }

        Command::Edit { id, flags } => {
            let mut task = client.get_task(id).await?;
            flags.apply(&mut task);
            client.update_task(&task).await?;
            println!("Updated task {}.", id);
        }

        Command::Delete { id } => {
            client.delete_task(id).await?;
            println!("Deleted task {}.", id);
        }

        Command::Capture { text } => {
            let (draft, categories) =
                try_join(client.process_text(&text), client.list_categories()).await?;
            print_task(&draft, &categories);
            let created = client.create_task(&draft).await?;
            println!(
                "Created task {}.",
                created.id.map(|id| id.to_string()).unwrap_or_default()
            );
        }

        Command::Categories => {
            for category in client.list_categories().await? {
                println!("{:>5}  {}", category.id, category.name);
            }
        }

        Command::Schedule { date } => {
            let date = date.unwrap_or_else(today);
            let (tasks, categories) =
                try_join(client.list_tasks(), client.list_categories()).await?;
            let agenda = agenda_for(&tasks, date);
            println!("{}", date.format("%A, %-d %B %Y"));
            if agenda.is_empty() {
                println!("  Nothing planned.");
            }
            for task in agenda {
                println!("{}", task_line(task, &categories));
            }
        }

        Command::Week { date } => {
            let (tasks, categories) =
                try_join(client.list_tasks(), client.list_categories()).await?;
            for (day, agenda) in week_of(&tasks, date.unwrap_or_else(today)) {
                println!("{}", day.format("%A, %-d %B"));
                for task in agenda {
                    println!("{}", task_line(task, &categories));
                }
            }
        }

        Command::Briefing { date } => {
            let tasks = client.list_tasks().await?;
            println!("{}", daily_briefing(&tasks, date.unwrap_or_else(today)));
        }

        Command::Stats => {
            let (tasks, categories) =
                try_join(client.list_tasks(), client.list_categories()).await?;
            let stats = TaskStatistics::compute(&tasks, &categories, Local::now().naive_local());

            println!("Total tasks:      {}", stats.total);
            println!("With reminders:   {}", stats.with_reminders);
            println!("Upcoming:         {}", stats.upcoming);
            println!();
            println!("By category:");
            for share in &stats.by_category {
                println!(
                    "  {:<12} {:>4}  {:>5.1}%",
                    share.name,
                    share.count,
                    share.fraction * 100.0
                );
            }
            println!();
            println!("By frequency:");
            for (frequency, count) in &stats.by_frequency {
                println!("  {:<12} {:>4}", frequency.display_name(), count);
            }
            if !stats.next_up.is_empty() {
                println!();
                println!("Next up:");
                for id in stats.next_up.iter().flatten() {
                    if let Some(task) = tasks.iter().find(|t| t.id == Some(*id)) {
                        println!("{}", task_line(task, &categories));
                    }
                }
            }
        }
    }
    Ok(())
}
