use comfy_table::{Cell, Color, Row, Table};
use hearthcal_core::models::{AnnualEvent, EventStatus, Occurrence};

pub fn display_occurrences(occurrences: &[Occurrence]) {
    if occurrences.is_empty() {
        println!("No events in this range.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Date", "Time", "Name", "Status", "Assigned", "Location", "Id",
    ]);

    for occ in occurrences {
        let mut row = Row::new();
        row.add_cell(Cell::new(occ.display_date.to_string()));

        let time = match occ.end_time {
            Some(end) => format!("{}-{}", occ.time.format("%H:%M"), end.format("%H:%M")),
            None => occ.time.format("%H:%M").to_string(),
        };
        row.add_cell(Cell::new(time));

        let mut name = String::new();
        if occ.is_recurring {
            name.push('↻');
            name.push(' ');
        }
        name.push_str(&occ.name);
        if occ.has_exception {
            name.push_str(" *");
        }
        row.add_cell(Cell::new(name));

        let status_cell = match occ.status {
            EventStatus::Active => Cell::new("active").fg(Color::Green),
            EventStatus::Completed => Cell::new("completed").fg(Color::Blue),
            EventStatus::Cancelled => {
                let label = match &occ.cancellation_reason {
                    Some(reason) => format!("cancelled ({})", reason),
                    None => "cancelled".to_string(),
                };
                Cell::new(label).fg(Color::Red)
            }
            EventStatus::Inactive => Cell::new("inactive").fg(Color::DarkGrey),
            EventStatus::Deleted => Cell::new("deleted").fg(Color::DarkGrey),
        };
        row.add_cell(status_cell);

        row.add_cell(Cell::new(occ.assigned_to.clone().unwrap_or_default()));
        row.add_cell(Cell::new(occ.location.clone().unwrap_or_default()));
        row.add_cell(Cell::new(occ.id.clone()));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_annual_events(events: &[AnnualEvent]) {
    if events.is_empty() {
        println!("No annual events.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Date", "Name", "Kind", "Reminders"]);
    for event in events {
        let mut row = Row::new();
        row.add_cell(Cell::new(event.id.clone()));
        row.add_cell(Cell::new(event.date.to_string()));
        row.add_cell(Cell::new(event.name.clone()));
        row.add_cell(Cell::new(event.kind.to_string()));
        row.add_cell(Cell::new(if event.notify_prior { "yes" } else { "no" }));
        table.add_row(row);
    }

    println!("{table}");
}
