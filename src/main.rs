use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::info;

use lead_desk::api::{LeadsApi, LeadsClient};
use lead_desk::config;
use lead_desk::forms::{AgentForm, CommentForm, LeadEdit, LeadForm};
use lead_desk::model::{Priority, Status};
use lead_desk::pages::{
    AddLeadPage, AgentBoardPage, AgentsPage, DashboardPage, LeadDetailPage, LeadListPage,
    LeadSettingsPage, Notice, ReportsPage, StatusBoardPage,
};
use lead_desk::render::Renderer;
use lead_desk::style::Painter;
use lead_desk::view::{LeadFilter, SortSpec, ViewState};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Status summary and leads, optionally narrowed to one status
    Dashboard {
        #[arg(long)]
        status: Option<Status>,
    },
    /// Filterable, sortable lead list
    Leads {
        #[arg(long)]
        status: Option<Status>,
        /// Sales agent ID
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        sort_priority: bool,
        /// Longest time to close first
        #[arg(long)]
        sort_time: bool,
    },
    /// Leads grouped by status
    StatusBoard {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        sort_time: bool,
    },
    /// Leads grouped by sales agent
    AgentBoard {
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        sort_time: bool,
    },
    /// Pipeline, status and agent charts
    Report,
    #[command(subcommand)]
    Lead(LeadCommand),
    #[command(subcommand)]
    Agents(AgentsCommand),
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
enum LeadCommand {
    /// Lead details and comments
    Show { id: String },
    Add(LeadAddArgs),
    Edit(LeadEditArgs),
    Delete { id: String },
    Comment {
        id: String,
        /// Sales agent ID of the author
        #[arg(long)]
        author: String,
        text: String,
    },
}

#[derive(Debug, ClapArgs)]
struct LeadAddArgs {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    source: String,
    /// Sales agent ID
    #[arg(long, default_value = "")]
    agent: String,
    #[arg(long, default_value = "")]
    status: String,
    #[arg(long, default_value = "")]
    priority: String,
    /// Days until expected close
    #[arg(long, default_value = "")]
    time_to_close: String,
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[derive(Debug, ClapArgs)]
struct LeadEditArgs {
    id: String,
    #[arg(long, default_value = "")]
    agent: String,
    #[arg(long, default_value = "")]
    status: String,
    #[arg(long, default_value = "")]
    priority: String,
    #[arg(long, default_value = "")]
    time_to_close: String,
    /// Replaces all tags when given
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum AgentsCommand {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print a sample configuration file
    Example,
}

fn sort_spec(by_priority: bool, by_time_to_close: bool) -> SortSpec {
    SortSpec {
        by_priority,
        by_time_to_close,
    }
}

fn failed(notice: Notice) -> ExitCode {
    eprintln!("{notice}");
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::Config(ConfigCommand::Example) = args.command {
        print!("{}", config::example());
        return Ok(ExitCode::SUCCESS);
    }

    if !args.config.exists() {
        info!(path = %args.config.display(), "config file not found, using defaults");
    }
    let mut cfg = config::load_or_default(Some(&args.config))
        .with_context(|| format!("loading {}", args.config.display()))?;
    cfg.apply_env().context("applying environment overrides")?;

    let client = LeadsClient::from_config(&cfg).context("building API client")?;
    info!(base_url = %client.base_url(), "using leads service");

    let painter = Painter::new(cfg.display.color && !args.no_color && std::io::stdout().is_terminal());
    let renderer = Renderer::new(painter, cfg.display.timestamp_format.clone());

    run(&client, &renderer, args.command).await
}

async fn run(api: &dyn LeadsApi, out: &Renderer, command: Command) -> Result<ExitCode> {
    match command {
        Command::Dashboard { status } => {
            let page = DashboardPage::new(api);
            page.load().await;
            print!("{}", out.dashboard(&page.view(status).await));
        }
        Command::Leads {
            status,
            agent,
            priority,
            sort_priority,
            sort_time,
        } => {
            let state = ViewState {
                filter: LeadFilter {
                    status,
                    agent_id: agent,
                    priority,
                },
                sort: sort_spec(sort_priority, sort_time),
            };
            let list = LeadListPage::new(api).load(&state).await;
            print!("{}", out.lead_list(&list));
        }
        Command::StatusBoard {
            agent,
            priority,
            sort_time,
        } => {
            let state = ViewState {
                filter: LeadFilter {
                    status: None,
                    agent_id: agent,
                    priority,
                },
                sort: sort_spec(false, sort_time),
            };
            let board = StatusBoardPage::new(api).load(&state).await;
            print!("{}", out.status_board(&board));
        }
        Command::AgentBoard {
            status,
            priority,
            sort_time,
        } => {
            let state = ViewState {
                filter: LeadFilter {
                    status,
                    agent_id: None,
                    priority,
                },
                sort: sort_spec(false, sort_time),
            };
            let board = AgentBoardPage::new(api).load(&state).await;
            print!("{}", out.agent_board(&board));
        }
        Command::Report => {
            let report = ReportsPage::new(api).load().await;
            print!("{}", out.report(&report));
        }
        Command::Lead(cmd) => return run_lead(api, out, cmd).await,
        Command::Agents(cmd) => return run_agents(api, out, cmd).await,
        Command::Config(ConfigCommand::Example) => print!("{}", config::example()),
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_lead(api: &dyn LeadsApi, out: &Renderer, command: LeadCommand) -> Result<ExitCode> {
    match command {
        LeadCommand::Show { id } => {
            let detail = LeadDetailPage::new(api, id).load().await;
            print!("{}", out.lead_detail(&detail));
        }
        LeadCommand::Add(add) => {
            let form = LeadForm {
                name: add.name,
                source: add.source,
                sales_agent: add.agent,
                status: add.status,
                priority: add.priority,
                time_to_close: add.time_to_close,
                tags: add.tags,
            };
            match AddLeadPage::new(api).submit(&form).await {
                Ok(lead) => {
                    println!("{}", Notice::success("Lead created successfully"));
                    println!("{}", out.lead_line(&lead));
                }
                Err(notice) => return Ok(failed(notice)),
            }
        }
        LeadCommand::Edit(edit) => {
            let form = LeadEdit {
                sales_agent: edit.agent,
                status: edit.status,
                priority: edit.priority,
                time_to_close: edit.time_to_close,
                tags: (!edit.tags.is_empty()).then_some(edit.tags),
            };
            match LeadDetailPage::new(api, edit.id).update(&form).await {
                Ok(lead) => {
                    println!("{}", Notice::success("Lead updated successfully"));
                    println!("{}", out.lead_line(&lead));
                }
                Err(notice) => return Ok(failed(notice)),
            }
        }
        LeadCommand::Delete { id } => {
            let page = LeadSettingsPage::new(api);
            match page.delete(&id).await {
                Ok(()) => {
                    println!("{}", Notice::success("Lead deleted successfully"));
                    print!("{}", out.leads(&page.leads().await));
                }
                Err(notice) => return Ok(failed(notice)),
            }
        }
        LeadCommand::Comment { id, author, text } => {
            let page = LeadDetailPage::new(api, id);
            match page.add_comment(&CommentForm { author, text }).await {
                Ok(_) => {
                    println!("{}", Notice::success("Comment added successfully"));
                    print!("{}", out.lead_detail(&page.load().await));
                }
                Err(notice) => return Ok(failed(notice)),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_agents(
    api: &dyn LeadsApi,
    out: &Renderer,
    command: AgentsCommand,
) -> Result<ExitCode> {
    let page = AgentsPage::new(api);
    match command {
        AgentsCommand::List => {
            print!("{}", out.agents(&page.load().await));
        }
        AgentsCommand::Add { name, email } => match page.create(&AgentForm { name, email }).await {
            Ok(_) => {
                println!("{}", Notice::success("Sales agent added successfully"));
                print!("{}", out.agents(&page.agents().await));
            }
            Err(notice) => return Ok(failed(notice)),
        },
        AgentsCommand::Delete { id } => {
            let res = page.delete(&id).await;
            print!("{}", out.agents(&page.agents().await));
            match res {
                Ok(()) => println!("{}", Notice::success("Sales agent deleted successfully")),
                Err(notice) => return Ok(failed(notice)),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
