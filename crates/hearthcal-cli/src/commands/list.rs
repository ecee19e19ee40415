use anyhow::Result;
use chrono::Duration;

use hearthcal_core::materialize::materialize_occurrences;
use hearthcal_core::repository::EventRepository;
use hearthcal_core::timezone::local_today;

use crate::cli::ListCommand;
use crate::views::table::display_occurrences;
use crate::App;

pub async fn list_events(app: &App<'_>, command: ListCommand) -> Result<()> {
    let from = command.from.unwrap_or_else(|| local_today(app.timezone));
    let to = command
        .to
        .unwrap_or(from + Duration::days(i64::from(app.config.lookahead_days)));

    let definitions = app.repo.find_events_for_family(&app.config.family_id).await?;
    let occurrences = materialize_occurrences(&definitions, from, to);
    display_occurrences(&occurrences);

    Ok(())
}
