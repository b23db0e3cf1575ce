use std::error::Error;

use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};

use daybook::cache::{CacheStore, FileCache};
use daybook::config::DaybookConfig;
use daybook::core::calendar;
use daybook::core::fitness::{ActivityKind, NewActivity};
use daybook::core::query::{self, Filter, Quadrant};
use daybook::core::task::{Level, NewTask, Task, TaskStatus};
use daybook::remote::rest::RestStore;
use daybook::remote::{keyring, Offline, RemoteStore};
use daybook::sync::activities::ActivityLog;
use daybook::sync::runtime::SyncRuntime;
use daybook::sync::{NoticeLevel, TaskStore};

#[derive(Parser)]
#[command(name = "daybook", version, about = "Tasks and calendar from the terminal")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "DAYBOOK_CONFIG")]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tasks, optionally for one day
    List {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        completed: Option<bool>,
        #[arg(long, value_parser = parse_level)]
        priority: Option<Level>,
        #[arg(long)]
        label: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a task
    Add {
        title: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_level, default_value = "medium")]
        priority: Level,
        #[arg(long, value_parser = parse_level, default_value = "low")]
        urgency: Level,
        #[arg(long = "label")]
        labels: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        /// Estimated minutes
        #[arg(long)]
        estimate: Option<u32>,
    },
    /// Toggle completion
    Toggle { id: String },
    /// Move to a Kanban column (todo, in_progress, done)
    Status {
        id: String,
        #[arg(value_parser = parse_status)]
        status: TaskStatus,
    },
    /// Move into a matrix quadrant (e.g. urgent-important)
    Move {
        id: String,
        #[arg(value_parser = parse_quadrant)]
        quadrant: Quadrant,
    },
    /// Move to another day
    Reschedule {
        id: String,
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
    Delete { id: String },
    /// Urgency x priority matrix
    Matrix,
    /// Kanban columns of incomplete tasks
    Kanban,
    /// Tasks of the week containing a day
    Week {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Four-week timeline
    Gantt {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Fetch from the remote store and report status
    Sync,
    /// Store the remote API key in the system keyring
    Login {
        key: String,
        /// Remote URL to save in the config file first
        #[arg(long)]
        url: Option<String>,
    },
    /// Remove the stored API key
    Logout,
    /// Fitness activities
    Activity {
        #[command(subcommand)]
        command: ActivityCommand,
    },
}

#[derive(Subcommand)]
enum ActivityCommand {
    Add {
        title: String,
        #[arg(long, value_parser = parse_kind, default_value = "cardio")]
        kind: ActivityKind,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        calories: Option<u32>,
        #[arg(long, value_parser = parse_level)]
        intensity: Option<Level>,
    },
    /// Activities of the week containing a day
    List {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    Delete { id: String },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let today = Local::now().date_naive();
    match s {
        "today" => Ok(today),
        "tomorrow" => Ok(today + Duration::days(1)),
        "yesterday" => Ok(today - Duration::days(1)),
        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("{}: expected YYYY-MM-DD", e)),
    }
}

fn parse_level(s: &str) -> Result<Level, String> {
    Level::parse(s).ok_or_else(|| format!("unknown level {:?} (low, medium, high)", s))
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse(s).ok_or_else(|| format!("unknown status {:?} (todo, in_progress, done)", s))
}

fn parse_quadrant(s: &str) -> Result<Quadrant, String> {
    Quadrant::parse(s).ok_or_else(|| format!("unknown quadrant {:?}", s))
}

fn parse_kind(s: &str) -> Result<ActivityKind, String> {
    ActivityKind::parse(s).ok_or_else(|| format!("unknown activity type {:?}", s))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(DaybookConfig::default_path);
    daybook::init_logging("daybook", false);
    let mut config = DaybookConfig::load(&config_path);
    daybook::set_debug_logging(config.debug_logging);
    config.ensure_directories()?;

    match &cli.command {
        Command::Login { key, url } => {
            if let Some(url) = url {
                // Save the file's own values, not the environment overrides.
                let mut stored = DaybookConfig::load_file(&config_path);
                stored.remote.url = url.trim().to_string();
                stored.save(&config_path)?;
                config.remote.url = stored.remote.url;
                println!("Remote URL saved to {}", config_path.display());
            }
            let Some(server) = config.remote_server() else {
                return Err("no remote URL configured; pass --url or set DAYBOOK_REMOTE_URL".into());
            };
            keyring::store_api_key(server, key).await?;
            println!("API key stored for {}", server);
            return Ok(());
        }
        Command::Logout => {
            let Some(server) = config.remote_server() else {
                return Err("no remote URL configured".into());
            };
            keyring::delete_api_key(server).await?;
            println!("API key removed for {}", server);
            return Ok(());
        }
        Command::Activity { command } => {
            return run_activity(command, FileCache::new(config.cache_directory()));
        }
        _ => {}
    }

    let Some(server) = config.remote_server().map(str::to_string) else {
        log::info!("No remote configured, working offline");
        return run(cli.command, &config, Offline).await;
    };

    let api_key = if config.remote.api_key.is_empty() {
        match keyring::load_api_key(&server).await {
            Ok(key) => key.unwrap_or_default(),
            Err(e) => {
                log::warn!("Keyring unavailable: {}", e);
                String::new()
            }
        }
    } else {
        config.remote.api_key.clone()
    };
    let remote = RestStore::new(&server, &api_key, &config.remote.table)?;
    run(cli.command, &config, remote).await
}

async fn run<R: RemoteStore + 'static>(
    command: Command,
    config: &DaybookConfig,
    remote: R,
) -> Result<(), Box<dyn Error>> {
    let mut store = TaskStore::new(FileCache::new(config.cache_directory()), remote);
    let mut runtime = SyncRuntime::new();
    runtime.spawn(store.begin_load());
    settle(&mut runtime, &mut store).await;
    let today = Local::now().date_naive();

    match command {
        Command::List {
            date,
            completed,
            priority,
            label,
            json,
        } => {
            store.set_filter(Filter {
                completed,
                priority,
                label,
            });
            let tasks = match date {
                Some(day) => store.tasks_for_date(day),
                None => query::sort_by_date(&store.filtered_tasks()),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                print_tasks(&tasks);
            }
        }
        Command::Add {
            title,
            date,
            priority,
            urgency,
            labels,
            description,
            estimate,
        } => {
            let day = date.unwrap_or(today);
            let mut draft = NewTask::new(title, day.and_time(Local::now().time()))
                .priority(priority)
                .urgency(urgency);
            draft.labels = labels;
            draft.description = description;
            draft.estimated_duration = estimate;
            let pending = store.add_task(draft)?;
            println!("{}", pending.task_id().unwrap_or_default());
            runtime.spawn(pending);
        }
        Command::Toggle { id } => {
            let id = resolve_id(&store, &id)?;
            let pending = store.toggle_task_completion(&id)?;
            runtime.spawn(pending);
        }
        Command::Status { id, status } => {
            let id = resolve_id(&store, &id)?;
            let pending = store.set_task_status(&id, status)?;
            runtime.spawn(pending);
        }
        Command::Move { id, quadrant } => {
            let id = resolve_id(&store, &id)?;
            let pending = store.move_to_quadrant(&id, quadrant)?;
            runtime.spawn(pending);
        }
        Command::Reschedule { id, date } => {
            let id = resolve_id(&store, &id)?;
            let pending = store.reschedule(&id, date)?;
            runtime.spawn(pending);
        }
        Command::Delete { id } => {
            let id = resolve_id(&store, &id)?;
            let pending = store.delete_task(&id)?;
            runtime.spawn(pending);
        }
        Command::Matrix => {
            let matrix = query::categorize_by_matrix(&store.filtered_tasks());
            for quadrant in Quadrant::ALL {
                println!("== {} ==", quadrant.as_str());
                print_tasks(matrix.bucket(quadrant));
            }
        }
        Command::Kanban => {
            for (status, tasks) in query::kanban_columns(store.tasks()) {
                println!("== {} ({}) ==", status.as_str(), tasks.len());
                print_tasks(&tasks);
            }
        }
        Command::Week { date } => {
            for day in calendar::week_days(date.unwrap_or(today)) {
                println!("== {} ==", day.format("%a %Y-%m-%d"));
                print_tasks(&store.tasks_for_date(day));
            }
        }
        Command::Gantt { date } => {
            let window = calendar::GanttWindow::containing(date.unwrap_or(today));
            println!("{} .. {}", window.start, window.end());
            let tasks = query::tasks_in_window(&store.filtered_tasks(), window.start, calendar::GANTT_DAYS);
            for task in &tasks {
                println!(
                    "{:>5.1}%  {:>3}%  {}",
                    window.position(task.date.date()),
                    query::progress(task),
                    task.title
                );
            }
        }
        Command::Sync => {
            let last = store
                .last_synced()
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".into());
            println!(
                "{}: {} tasks, last synced {}",
                store.sync_status().as_str(),
                store.tasks().len(),
                last
            );
        }
        Command::Login { .. } | Command::Logout | Command::Activity { .. } => {}
    }

    settle(&mut runtime, &mut store).await;
    print_notices(&mut store);
    Ok(())
}

/// Apply outstanding remote outcomes. Ctrl-C abandons whatever is still in
/// flight; local changes are already cached.
async fn settle<C, R>(runtime: &mut SyncRuntime, store: &mut TaskStore<C, R>)
where
    C: CacheStore,
    R: RemoteStore,
{
    if runtime.is_idle() {
        return;
    }
    log::debug!("Waiting for {} remote operations", runtime.in_flight());
    let interrupted = tokio::select! {
        _ = runtime.drain_into(store) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        runtime.shutdown().await;
        eprintln!("interrupted; pending changes were saved locally only");
    }
}

fn run_activity(command: &ActivityCommand, cache: FileCache) -> Result<(), Box<dyn Error>> {
    let mut activity_log = ActivityLog::load(cache);
    let today = Local::now().date_naive();
    match command {
        ActivityCommand::Add {
            title,
            kind,
            date,
            duration,
            calories,
            intensity,
        } => {
            let day = date.unwrap_or(today);
            let mut draft = NewActivity::new(title.clone(), *kind, day.and_time(Local::now().time()));
            draft.duration = *duration;
            draft.calories = *calories;
            if intensity.is_some() {
                draft.intensity = *intensity;
            }
            let activity = activity_log.add(draft)?;
            println!("{}", activity.id);
        }
        ActivityCommand::List { date } => {
            for (day, activities) in activity_log.week(date.unwrap_or(today)) {
                println!("== {} ==", day.format("%a %Y-%m-%d"));
                for a in activities {
                    println!(
                        "  {:8} {:18} {:>4} min  {}",
                        short_id(&a.id),
                        a.kind.label(),
                        a.duration.unwrap_or(0),
                        a.title
                    );
                }
            }
        }
        ActivityCommand::Delete { id } => activity_log.delete(id)?,
    }
    Ok(())
}

/// Accept a full id or a unique prefix of one.
fn resolve_id<C, R>(store: &TaskStore<C, R>, prefix: &str) -> Result<String, String>
where
    C: CacheStore,
    R: RemoteStore,
{
    let matches: Vec<&Task> = store.tasks().iter().filter(|t| t.id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => Err(format!("no task matches {:?}", prefix)),
        _ => Err(format!("{:?} matches {} tasks", prefix, matches.len())),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn print_tasks(tasks: &[Task]) {
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        let labels = if task.labels.is_empty() {
            String::new()
        } else {
            format!(" [{}]", task.labels.join(", "))
        };
        println!(
            "  [{}] {:8} {} {:6} {:11} {}{}",
            mark,
            short_id(&task.id),
            task.date.format("%Y-%m-%d"),
            task.priority.as_str(),
            task.status.as_str(),
            task.title,
            labels
        );
    }
}

fn print_notices<C, R>(store: &mut TaskStore<C, R>)
where
    C: CacheStore,
    R: RemoteStore,
{
    for notice in store.take_notices() {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice.message),
            NoticeLevel::Warning => eprintln!("warning: {}", notice.message),
        }
    }
}
