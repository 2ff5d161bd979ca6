//! Command handlers for the smartask binary

use crate::{CalendarCommand, Command, ListCommand, MinimumCommand, RuleSetCommand, VacationCommand};
use anyhow::{bail, Context, Result};
use smartask_client::correlation::SseTransport;
use smartask_client::forms::{GenerationForm, RuleCatalog, RuleSetDraft};
use smartask_client::holidays::{holiday_map, is_holiday, HolidayClient};
use smartask_client::submission::AnalysisInput;
use smartask_client::{BackendClient, CalendarView, CompareView};
use smartask_common::config::ClientConfig;
use smartask_common::events::{ClientEvent, EventBus};
use smartask_common::grid::{abbreviate, days_in_month, legend, ScheduleGrid};
use smartask_common::metrics::{KpiReport, MetricDiff, ReportStatus, Tone};
use smartask_common::models::{sort_recent_first, team_color_mapping, Schedule};
use smartask_common::CalendarId;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub async fn run(command: Command, config: &ClientConfig) -> Result<()> {
    let client = BackendClient::from_config(config)?;

    match command {
        Command::Calendars(command) => calendars(&client, config, command).await,
        Command::Analyze { id } => analyze(&client, config, CalendarId::new(id)).await,
        Command::Compare { one, two } => {
            compare(&client, config, CalendarId::new(one), CalendarId::new(two)).await
        }
        Command::Tasks => tasks(&client).await,
        Command::Rulesets(command) => rulesets(&client, command).await,
        Command::Vacations(command) => vacations(&client, command).await,
        Command::Minimums(command) => minimums(&client, command).await,
        Command::Employees(ListCommand::List) => {
            for employee in client.list_employees().await? {
                println!("{}\t{}", employee.id.unwrap_or_default(), employee.name);
            }
            Ok(())
        }
        Command::Teams(ListCommand::List) => {
            let teams = client.list_teams().await?;
            let colors = team_color_mapping(teams.iter().map(|t| t.name.as_str()));
            for team in &teams {
                let members: Vec<&str> = team.employees.iter().map(|e| e.name.as_str()).collect();
                println!(
                    "{} [{}]: {}",
                    team.name,
                    colors.get(&team.name).copied().unwrap_or_default(),
                    members.join(", ")
                );
            }
            Ok(())
        }
        Command::Holidays { year } => {
            let holidays = HolidayClient::from_config(config)?.public_holidays(year).await?;
            for holiday in holidays {
                println!("{}\t{}\t{}", holiday.date, holiday.local_name, holiday.name);
            }
            Ok(())
        }
    }
}

async fn calendars(client: &BackendClient, config: &ClientConfig, command: CalendarCommand) -> Result<()> {
    match command {
        CalendarCommand::List => {
            for schedule in client.list_schedules().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    schedule.id.as_deref().unwrap_or("-"),
                    schedule.title,
                    schedule.algorithm.as_deref().unwrap_or("-"),
                    schedule
                        .timestamp
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default()
                );
            }
            Ok(())
        }
        CalendarCommand::Show {
            id,
            month,
            from,
            to,
            holidays,
        } => {
            let schedule = client.fetch_schedule(&CalendarId::new(id)).await?;
            show_calendar(config, &schedule, month, from, to, holidays).await
        }
        CalendarCommand::Export { id, out } => {
            let schedule = client.fetch_schedule(&CalendarId::new(id)).await?;
            let csv = ScheduleGrid::new(schedule.data).to_csv();
            tokio::fs::write(&out, csv)
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            info!("Exported '{}' to {}", schedule.title, out.display());
            Ok(())
        }
        CalendarCommand::Generate {
            title,
            year,
            max_duration,
            algorithm,
            team,
            start,
            end,
            vacation_template,
            minimums,
        } => {
            let form = GenerationForm {
                title,
                year,
                max_duration,
                algorithm,
                team,
                start,
                end,
                vacation_template,
                minimum_template: minimums,
            };
            let request = form.build(chrono::Utc::now())?;
            let ack = client.generate_schedule(&request).await?;
            println!("{}", ack);
            Ok(())
        }
        CalendarCommand::Clean { yes } => {
            if !yes {
                bail!("Refusing to delete every calendar without --yes");
            }
            client.clean_schedules().await?;
            println!("All calendars deleted");
            Ok(())
        }
    }
}

async fn show_calendar(
    config: &ClientConfig,
    schedule: &Schedule,
    month: Option<u32>,
    from: Option<u32>,
    to: Option<u32>,
    mark_holidays: bool,
) -> Result<()> {
    let grid = ScheduleGrid::new(schedule.data.clone());
    if grid.is_empty() {
        println!("No data available for '{}'", schedule.title);
        return Ok(());
    }

    let year = schedule
        .metadata
        .as_ref()
        .and_then(|m| m.year)
        .context("Calendar metadata carries no year")?;

    let (grid, month) = match month {
        Some(month) => {
            let last = days_in_month(year, month)
                .with_context(|| format!("Invalid month {}", month))?;
            let start = from.unwrap_or(1);
            let sliced = grid.month_slice(year, month, start, to.unwrap_or(last))?;
            (sliced, Some((month, start)))
        }
        None => (grid, None),
    };

    let holidays = if mark_holidays {
        match HolidayClient::from_config(config)?.public_holidays(year).await {
            Ok(list) => Some(holiday_map(&list)),
            Err(e) => {
                warn!("Holiday lookup failed, rendering without holidays: {}", e);
                None
            }
        }
    } else {
        None
    };

    println!("{} ({})", schedule.title, year);
    for (row_index, row) in grid.rows().iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                if col == 0 {
                    return format!("{:<12}", cell);
                }
                if row_index == 0 {
                    let marked = match (&holidays, month) {
                        (Some(map), Some((month, start))) => {
                            is_holiday(map, month, start + col as u32 - 1)
                        }
                        _ => false,
                    };
                    return format!("{:>4}", if marked { format!("{}*", cell) } else { cell.clone() });
                }
                format!("{:>4}", abbreviate(cell))
            })
            .collect();
        println!("{}", cells.join(""));
    }

    let legend: Vec<String> = legend()
        .into_iter()
        .map(|(label, color)| format!("{} {}", label, color))
        .collect();
    println!("\n{}", legend.join(" | "));
    Ok(())
}

async fn analyze(client: &BackendClient, config: &ClientConfig, calendar_id: CalendarId) -> Result<()> {
    let schedule = client.fetch_schedule(&calendar_id).await?;
    let input = AnalysisInput::from_schedule(&schedule)?;

    let bus = Arc::new(EventBus::new(100));
    spawn_event_logger(&bus);

    let transport = SseTransport::from_config(config)?;
    let mut view = CalendarView::mount(calendar_id, transport, &config.topic, Some(Arc::clone(&bus))).await?;
    view.submit(client, &input).await?;
    println!("Analysis submitted for '{}', waiting for result...", schedule.title);

    tokio::select! {
        result = view.wait_for_result() => {
            if result.is_none() {
                bail!("Result stream ended before a result arrived");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted while waiting for analysis result");
            return Ok(());
        }
    }

    match view.report()? {
        Some(report) => print_report(&schedule.title, &report),
        None => println!("No data available"),
    }
    view.unmount();
    Ok(())
}

async fn compare(
    client: &BackendClient,
    config: &ClientConfig,
    one: CalendarId,
    two: CalendarId,
) -> Result<()> {
    let first = client.fetch_schedule(&one).await?;
    let second = client.fetch_schedule(&two).await?;
    let inputs = [
        AnalysisInput::from_schedule(&first)?,
        AnalysisInput::from_schedule(&second)?,
    ];

    let bus = Arc::new(EventBus::new(100));
    spawn_event_logger(&bus);

    let transport = SseTransport::from_config(config)?;
    let mut view = CompareView::mount(one, two, transport, &config.topic, Some(Arc::clone(&bus))).await?;
    for input in &inputs {
        view.submit(client, input).await?;
    }
    println!(
        "Comparing '{}' with '{}', waiting for results...",
        first.title, second.title
    );

    tokio::select! {
        complete = view.wait_until_complete() => {
            if !complete {
                bail!("Result stream ended before both results arrived");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted while waiting for comparison results");
            return Ok(());
        }
    }

    if let Some(diffs) = view.comparison()? {
        print_comparison(&first.title, &second.title, &diffs);
    }
    view.unmount();
    Ok(())
}

fn spawn_event_logger(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event {
                ClientEvent::AnalysisResultReceived { calendar_id, .. } => {
                    info!("Result received for calendar {}", calendar_id)
                }
                ClientEvent::ListenerStateChanged { topic, new_state, .. } => {
                    debug!(topic = %topic, state = new_state.as_str(), "Subscription state changed")
                }
                other => debug!(event = ?other, "Client event"),
            }
        }
    });
}

fn tone_marker(tone: Tone) -> &'static str {
    match tone {
        Tone::Adverse => "▲",
        Tone::Favorable => "▼",
        Tone::Neutral => " ",
    }
}

fn print_report(title: &str, report: &KpiReport) {
    println!("\nKPI report: {}", title);
    for line in &report.lines {
        println!(
            "  {} {:<34} {:>10}   {}",
            tone_marker(line.tone),
            line.metric.label(),
            line.display,
            line.metric.description()
        );
    }
    match report.status {
        ReportStatus::NoIssues => println!("\nNo issues found"),
        ReportStatus::IssuesFound => println!("\n{} issue(s) found", report.issue_count),
    }
}

fn print_comparison(one: &str, two: &str, diffs: &[MetricDiff]) {
    println!("\n{:<36} {:>12} {:>12} {:>12}", "Metric", one, two, "Difference");
    for diff in diffs {
        println!(
            "{:<36} {:>12} {:>12} {:>10} {}",
            diff.metric.label(),
            diff.one,
            diff.two,
            diff.display,
            tone_marker(diff.tone)
        );
    }
}

async fn tasks(client: &BackendClient) -> Result<()> {
    let mut tasks = client.list_tasks().await?;
    sort_recent_first(&mut tasks);
    for task in tasks {
        let request = task.request.unwrap_or_default();
        println!(
            "{}\t{}\t{}\t{}",
            task.task_id.or(task.id).unwrap_or_default(),
            task.status.label(),
            request.title.unwrap_or_default(),
            task.updated_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default()
        );
    }
    Ok(())
}

async fn rulesets(client: &BackendClient, command: RuleSetCommand) -> Result<()> {
    match command {
        RuleSetCommand::List => {
            for set in client.list_rulesets().await? {
                println!(
                    "{}\t{} rule(s)\t{}",
                    set.name,
                    set.rules.len(),
                    set.description.unwrap_or_default()
                );
            }
        }
        RuleSetCommand::Available => {
            for rule in client.available_rules().await? {
                println!(
                    "{}\t{:?}\t{}",
                    rule.rule_type,
                    rule.kind,
                    rule.description.unwrap_or_default()
                );
            }
        }
        RuleSetCommand::Create { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut draft: RuleSetDraft = serde_json::from_str(&text)
                .with_context(|| format!("Invalid rule-set draft in {}", file.display()))?;

            let catalog = match client.available_rules().await {
                Ok(rules) => RuleCatalog::from_rules(&rules),
                Err(e) => {
                    warn!("Rule catalog unavailable, using draft as written: {}", e);
                    RuleCatalog::default()
                }
            };
            for rule in &mut draft.rules {
                catalog.autofill(rule);
            }

            let existing: Vec<String> = client
                .list_rulesets()
                .await?
                .into_iter()
                .map(|set| set.name)
                .collect();
            let rule_set = draft.build(&existing)?;
            let created = client.create_ruleset(&rule_set).await?;
            println!("Created rule set '{}'", created.name);
        }
    }
    Ok(())
}

async fn vacations(client: &BackendClient, command: VacationCommand) -> Result<()> {
    match command {
        VacationCommand::List => {
            for template in client.list_vacation_templates().await? {
                println!(
                    "{}\t{}\t{} employee(s)",
                    template.id.unwrap_or_default(),
                    template.name,
                    template.vacations.len()
                );
            }
        }
        VacationCommand::Random { name } => {
            println!("{}", client.random_vacation_template(&name).await?);
        }
    }
    Ok(())
}

async fn minimums(client: &BackendClient, command: MinimumCommand) -> Result<()> {
    match command {
        MinimumCommand::List => {
            for template in client.list_minimum_templates().await? {
                println!("{}\t{}", template.id.unwrap_or_default(), template.name);
            }
        }
        MinimumCommand::Show { id } => {
            let template = client.minimum_template(&id).await?;
            println!("{}", template.name);
            println!("{}", ScheduleGrid::new(template.minimums).to_csv());
        }
        MinimumCommand::Import { name, file } => {
            let csv = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let created = client.create_minimum_template(&name, csv).await?;
            println!(
                "Imported '{}' ({})",
                created.name,
                created.id.unwrap_or_default()
            );
        }
    }
    Ok(())
}
