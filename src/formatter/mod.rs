pub struct Formatter {}

impl Formatter {
    const UNITS: [&'static str; 5] = ["B", "KB", "MB", "GB", "TB"];

    /// Human readable size with binary (1024) steps, e.g. `1.50 KB`.
    pub fn format_size(size: u64, precision: u8) -> String {
        let mut size_float = size as f64;
        let mut unit_index = 0;

        while size_float >= 1024.0 && unit_index < Self::UNITS.len() - 1 {
            size_float /= 1024.0;
            unit_index += 1;
        }

        format!(
            "{number:.prec$} {unit}",
            number = size_float,
            prec = precision as usize,
            unit = Self::UNITS[unit_index]
        )
    }
}
