use crate::models::TimeOfDay;

/// First bookable minute of the day (09:00).
pub const DAY_START_MINUTES: u16 = 9 * 60;
/// End of the bookable day (17:00), exclusive.
pub const DAY_END_MINUTES: u16 = 17 * 60;
pub const SLOT_MINUTES: u16 = 30;

/// Fixed daily slot template: `[start, end)` stepped by `step` minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTemplate {
    start: u16,
    end: u16,
    step: u16,
}

impl DailyTemplate {
    /// 09:00 to 17:00 in 30-minute slots.
    pub const fn standard() -> Self {
        Self {
            start: DAY_START_MINUTES,
            end: DAY_END_MINUTES,
            step: SLOT_MINUTES,
        }
    }

    /// Slot start times in ascending order. Each call restarts from the top.
    pub fn slots(&self) -> impl Iterator<Item = TimeOfDay> + Clone {
        let step = usize::from(self.step.max(1));
        (self.start..self.end)
            .step_by(step)
            .filter_map(TimeOfDay::from_minutes)
    }

    pub fn len(&self) -> usize {
        self.slots().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `time` is the start of one of the template's slots.
    pub fn contains(&self, time: TimeOfDay) -> bool {
        let minutes = time.minutes_since_midnight();
        minutes >= self.start
            && minutes < self.end
            && (minutes - self.start) % self.step.max(1) == 0
    }
}

impl Default for DailyTemplate {
    fn default() -> Self {
        Self::standard()
    }
}
