use anyhow::{Result, bail};
use bpaf::Bpaf;
use tracing::instrument;
use unisearch_sdk::detail::{DetailController, DetailFailure, DetailState};

use super::Session;
use crate::utils::render::render_detail;

// Show details of a university
#[derive(Debug, Bpaf, Clone)]
pub struct Show {
    /// Print the university record as JSON
    #[bpaf(long)]
    json: bool,

    /// The id of the university, as shown by 'unisearch list'
    #[bpaf(positional("ID"))]
    id: Option<String>,
}

impl Show {
    #[instrument(name = "show", skip_all)]
    pub async fn handle(self, session: Session) -> Result<()> {
        let controller = DetailController::new(session.client);
        controller.load(self.id.as_deref()).await?;

        match controller.state() {
            DetailState::Loaded(record) if self.json => {
                println!("{}", serde_json::to_string_pretty(record.as_json())?);
            },
            DetailState::Loaded(record) => println!("{}", render_detail(&record)),
            DetailState::Failed(DetailFailure::NotFound) => {
                bail!(
                    "university '{}' not found",
                    self.id.unwrap_or_default().trim()
                )
            },
            DetailState::Failed(DetailFailure::Network(message)) => bail!(message),
            DetailState::Idle | DetailState::Loading => bail!("loading did not complete"),
        }
        Ok(())
    }
}
