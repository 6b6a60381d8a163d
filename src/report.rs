use crate::sweep::{RowOutcome, SweepRow};

/// Render the sweep as a fixed-width text table. Rows without a score get
/// a blank similarity cell; the report does not say why a row failed.
pub fn render_table(rows: &[SweepRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>10}  {:>10}  {:>10}  {:>10}\n",
        "grayscale", "bilateral", "landmarks", "similarity"
    ));

    for row in rows {
        let similarity = match &row.outcome {
            RowOutcome::Score(score) => format!("{:.2}", score),
            _ => String::new(),
        };
        out.push_str(&format!(
            "{:>10}  {:>10}  {:>10}  {:>10}\n",
            row.flags.grayscale, row.flags.bilateral, row.flags.landmarks, similarity
        ));
    }

    out
}
