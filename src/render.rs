//! Plain-text rendering of page views for the terminal.
use std::fmt::Write;

use crate::model::{Agent, Lead};
use crate::pages::{AgentLeads, LeadDetail, LeadListView, Report, StatusBoard};
use crate::style::Painter;
use crate::view::LeadView;

const BAR_WIDTH: usize = 30;

pub struct Renderer {
    painter: Painter,
    timestamp_format: String,
}

impl Renderer {
    pub fn new(painter: Painter, timestamp_format: impl Into<String>) -> Self {
        Self {
            painter,
            timestamp_format: timestamp_format.into(),
        }
    }

    pub fn lead_line(&self, lead: &Lead) -> String {
        format!(
            "{} [{}]  {} | Agent: {} | Source: {} | {} days  ({})",
            lead.name,
            self.painter.priority(lead.priority),
            self.painter.status(lead.status),
            lead.agent_name(),
            lead.source,
            lead.time_to_close,
            lead.id,
        )
    }

    fn lead_lines(&self, out: &mut String, leads: &[Lead], empty: &str) {
        if leads.is_empty() {
            let _ = writeln!(out, "  {empty}");
            return;
        }
        for lead in leads {
            let _ = writeln!(out, "  {}", self.lead_line(lead));
        }
    }

    pub fn dashboard(&self, view: &LeadView) -> String {
        let mut out = String::new();
        let counts: Vec<String> = view
            .status_counts
            .iter()
            .map(|(status, n)| format!("{}: {n}", self.painter.status(status)))
            .collect();
        let _ = writeln!(out, "{}", counts.join("  "));
        let _ = writeln!(out, "Showing {} of {} leads", view.shown(), view.total);
        self.lead_lines(&mut out, &view.leads, "No leads found");
        out
    }

    pub fn lead_list(&self, list: &LeadListView) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total {} leads", list.view.shown());
        self.lead_lines(&mut out, &list.view.leads, "No leads found");
        out
    }

    pub fn status_board(&self, board: &StatusBoard) -> String {
        let mut out = String::new();
        for column in &board.columns {
            let _ = writeln!(
                out,
                "{} ({})",
                self.painter.status(column.status),
                column.leads.len()
            );
            self.lead_lines(&mut out, &column.leads, "No leads");
        }
        out
    }

    pub fn agent_board(&self, board: &[AgentLeads]) -> String {
        let mut out = String::new();
        if board.is_empty() {
            let _ = writeln!(out, "No sales agents found");
        }
        for entry in board {
            let _ = writeln!(
                out,
                "{} <{}> ({} leads)",
                entry.agent.name,
                entry.agent.email,
                entry.leads.len()
            );
            self.lead_lines(&mut out, &entry.leads, "No leads assigned");
        }
        out
    }

    pub fn report(&self, report: &Report) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Pipeline ({} leads total)", report.total);
        match &report.pipeline {
            Some(Ok(split)) => {
                let max = split.total().max(1) as usize;
                let _ = writeln!(out, "  {}", bar_row("Pipeline", split.pipeline as usize, max));
                let _ = writeln!(out, "  {}", bar_row("Other", split.other as usize, max));
            }
            Some(Err(err)) => {
                let _ = writeln!(out, "  data inconsistency: {err}");
            }
            None => {
                let _ = writeln!(out, "  unavailable");
            }
        }

        let _ = writeln!(out, "Leads by status");
        let max = report.status_counts.iter().map(|(_, n)| n).max().unwrap_or(0).max(1);
        for (status, n) in report.status_counts.iter() {
            let _ = writeln!(out, "  {}", bar_row(status.as_str(), n, max));
        }

        let _ = writeln!(out, "Leads by sales agent");
        if report.agent_counts.is_empty() {
            let _ = writeln!(out, "  No sales agents found");
        }
        let max = report.agent_counts.iter().map(|c| c.leads).max().unwrap_or(0).max(1);
        for count in &report.agent_counts {
            let _ = writeln!(out, "  {}", bar_row(&count.agent_name, count.leads, max));
        }
        out
    }

    pub fn lead_detail(&self, detail: &LeadDetail) -> String {
        let mut out = String::new();
        let Some(lead) = &detail.lead else {
            let _ = writeln!(out, "Lead not found");
            return out;
        };
        let _ = writeln!(out, "{} ({} priority)", lead.name, self.painter.priority(lead.priority));
        let _ = writeln!(out, "  Lead ID:       {}", lead.id);
        let agent_email = lead
            .sales_agent
            .as_ref()
            .and_then(|a| a.email())
            .map(|e| format!(" <{e}>"))
            .unwrap_or_default();
        let _ = writeln!(out, "  Sales agent:   {}{}", lead.agent_name(), agent_email);
        let _ = writeln!(out, "  Status:        {}", self.painter.status(lead.status));
        let _ = writeln!(out, "  Source:        {}", lead.source);
        let _ = writeln!(out, "  Time to close: {} days", lead.time_to_close);
        if !lead.tags.is_empty() {
            let _ = writeln!(out, "  Tags:          {}", lead.tags.join(", "));
        }

        let _ = writeln!(out, "Comments");
        if detail.comments.is_empty() {
            let _ = writeln!(out, "  No comments available");
        }
        for comment in &detail.comments {
            let when = comment
                .created_at
                .map(|ts| format!(" ({})", ts.format(&self.timestamp_format)))
                .unwrap_or_default();
            let _ = writeln!(out, "  {}{}: {}", comment.author_name(), when, comment.comment_text);
        }
        out
    }

    pub fn agents(&self, agents: &[Agent]) -> String {
        let mut out = String::new();
        if agents.is_empty() {
            let _ = writeln!(out, "No sales agents found");
        }
        for agent in agents {
            let _ = writeln!(out, "{}  <{}>  ({})", agent.name, agent.email, agent.id);
        }
        out
    }

    pub fn leads(&self, leads: &[Lead]) -> String {
        let mut out = String::new();
        self.lead_lines(&mut out, leads, "No leads found");
        out
    }
}

fn bar_row(label: &str, count: usize, max: usize) -> String {
    let width = count * BAR_WIDTH / max.max(1);
    format!("{label:<16} {:<width$} {count}", "█".repeat(width), width = BAR_WIDTH)
}
