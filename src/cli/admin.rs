//! Admin subcommands for extending the catalog.

use crate::types::{NewReward, NewTask, RewardKind, TaskKind};
use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Add a quest
    AddTask(AddTaskArgs),

    /// Add a reward
    AddReward(AddRewardArgs),
}

fn parse_task_kind(s: &str) -> Result<TaskKind, String> {
    TaskKind::parse(s).ok_or_else(|| format!("unknown task type '{}' (daily, once)", s))
}

fn parse_reward_kind(s: &str) -> Result<RewardKind, String> {
    RewardKind::parse(s)
        .ok_or_else(|| format!("unknown reward type '{}' (text, image, gemini-story)", s))
}

/// Arguments for `admin add-task`
#[derive(Args, Debug)]
pub struct AddTaskArgs {
    /// Admin password
    #[arg(long)]
    pub password: String,

    /// Explicit id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: String,

    /// daily or once
    #[arg(long = "type", value_parser = parse_task_kind)]
    pub kind: TaskKind,

    /// Days a daily quest must be done
    #[arg(long, default_value_t = 1)]
    pub duration: u32,

    /// Hearts awarded on completion
    #[arg(long, default_value_t = 0)]
    pub points: u32,
}

impl AddTaskArgs {
    pub fn to_new_task(&self) -> NewTask {
        NewTask {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            kind: self.kind,
            duration_days: self.duration,
            points: self.points,
        }
    }
}

/// Arguments for `admin add-reward`
#[derive(Args, Debug)]
pub struct AddRewardArgs {
    /// Admin password
    #[arg(long)]
    pub password: String,

    /// Explicit id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long)]
    pub title: String,

    /// text, image or gemini-story
    #[arg(long = "type", value_parser = parse_reward_kind)]
    pub kind: RewardKind,

    /// Text, image URL, or story prompt
    #[arg(long)]
    pub content: String,

    /// Price in hearts
    #[arg(long, default_value_t = 0)]
    pub cost: u32,
}

impl AddRewardArgs {
    pub fn to_new_reward(&self) -> NewReward {
        NewReward {
            id: self.id.clone(),
            title: self.title.clone(),
            kind: self.kind,
            content: self.content.clone(),
            cost: self.cost,
        }
    }
}
