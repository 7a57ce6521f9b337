use anyhow::{Result, bail};
use bpaf::Bpaf;
use tracing::instrument;
use unisearch_sdk::lock_profile;
use unisearch_sdk::profile::add_exam;

use super::Session;
use crate::utils::message;
use crate::utils::render::{money_usd, render_profile};

#[derive(Debug, Bpaf, Clone)]
pub enum ProfileCommands {
    /// Show your profile
    #[bpaf(command)]
    Show {
        /// Print the profile as JSON
        #[bpaf(long)]
        json: bool,
    },

    /// Set your username (3-12 latin letters or digits)
    #[bpaf(command)]
    Name {
        #[bpaf(positional("NAME"))]
        name: String,
    },

    /// Set your yearly budget in USD
    ///
    /// Anything that isn't a number clears the budget.
    #[bpaf(command)]
    Budget {
        #[bpaf(positional("USD"))]
        amount: String,
    },

    /// Add an exam result, checked with the catalog first
    #[bpaf(command("add-exam"))]
    AddExam {
        /// e.g. IELTS, GPA
        #[bpaf(positional("EXAM"))]
        exam: String,
        #[bpaf(positional("SCORE"))]
        score: String,
    },

    /// Remove an exam result by its number in 'unisearch profile show'
    #[bpaf(command("remove-exam"))]
    RemoveExam {
        #[bpaf(positional("NUMBER"))]
        number: usize,
    },

    /// Delete your profile
    #[bpaf(command)]
    Clear,
}

impl ProfileCommands {
    #[instrument(name = "profile", skip_all)]
    pub async fn handle(self, session: Session) -> Result<()> {
        match self {
            ProfileCommands::Show { json } => {
                let profile = lock_profile(&session.profile).profile().clone();
                if json {
                    println!("{}", serde_json::to_string_pretty(&profile)?);
                } else {
                    println!("{}", render_profile(&profile));
                }
            },
            ProfileCommands::Name { name } => {
                let mut store = lock_profile(&session.profile);
                store.set_name(&name)?;
                message::updated(format!("Username set to '{}'", store.profile().name));
            },
            ProfileCommands::Budget { amount } => {
                let mut store = lock_profile(&session.profile);
                store.commit_budget(&amount);
                match store.profile().budget_value() {
                    Some(budget) => {
                        message::updated(format!("Budget set to {}", money_usd(budget as f64)))
                    },
                    None => message::deleted("Budget cleared"),
                }
            },
            ProfileCommands::AddExam { exam, score } => {
                let added = add_exam(&session.profile, &session.client, &exam, &score).await?;
                message::created(format!("Added {} {}", added.exam, added.score));
            },
            ProfileCommands::RemoveExam { number } => {
                let Some(index) = number.checked_sub(1) else {
                    bail!("exam numbers start at 1");
                };
                let removed = lock_profile(&session.profile).remove_exam(index)?;
                message::deleted(format!("Removed {} {}", removed.exam, removed.score));
            },
            ProfileCommands::Clear => {
                lock_profile(&session.profile).clear();
                message::deleted("Profile cleared");
            },
        }
        Ok(())
    }
}
