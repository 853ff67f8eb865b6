pub mod formats;
pub mod plot;

use rtdataset_core::plot::XRED_CHOICES;

/// Value parser for `-r/--xred`.
pub fn parse_xred(s: &str) -> Result<u32, String> {
    let choices = XRED_CHOICES
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    match s.parse::<u32>() {
        Ok(v) if XRED_CHOICES.contains(&v) => Ok(v),
        _ => Err(format!("'{s}' is not one of {choices}")),
    }
}
