//! Hourly bar charts displayed inside cards.

/// Inclusive range of hours (0..=23) that matter for a chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HourRange {
    pub start: u32,
    pub end: u32,
}

impl HourRange {
    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start && hour <= self.end
    }
}

/// Display tuning for a chart.
///
/// `top` is the default value ceiling, raised in `step` increments until
/// it covers the data. Values at or below `min` are considered noise and
/// never make a chart worth showing. `high` is the value at which a bar
/// reaches full opacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChartOptions {
    pub top: i32,
    pub step: i32,
    pub min: i32,
    pub high: i32,
}

/// One value per hour of a 24-hour day, index = hour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chart {
    pub data: Vec<i32>,
    pub hours: HourRange,
    pub options: ChartOptions,
}

impl Chart {
    /// A chart is worth showing when at least one hour inside the
    /// relevant window holds a value strictly above `options.min`.
    /// A chart with no data is never valid.
    pub fn valid(&self) -> bool {
        self.data
            .iter()
            .enumerate()
            .any(|(hour, value)| self.hours.contains(hour as u32) && *value > self.options.min)
    }

    /// Largest data point, `None` when the chart holds no data.
    pub fn max_value(&self) -> Option<i32> {
        self.data.iter().copied().max()
    }

    /// Value ceiling used when scaling bars: `options.top` raised by
    /// whole `options.step`s until the data fits under it.
    pub fn ceiling(&self) -> i32 {
        let max = self.max_value().unwrap_or(0);
        let mut top = self.options.top;
        if self.options.step <= 0 {
            return top.max(max);
        }
        while top < max {
            top += self.options.step;
        }
        top
    }
}
