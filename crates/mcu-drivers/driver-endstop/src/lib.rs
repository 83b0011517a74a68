//! A `no_std` driver for reading the state of digital endstops.
//!
//! Each input carries its own active level (normally-open switches to ground
//! read active-low, optical gates often active-high), and an axis may have
//! no switch wired at one or both ends.

#![no_std]

use embedded_hal::digital::InputPin;

/// Index of the minimum-end input in an [`AxisEndstops`] pair.
pub const MIN_IDX: usize = 0;
/// Index of the maximum-end input in an [`AxisEndstops`] pair.
pub const MAX_IDX: usize = 1;

/// One endstop input with its active level, or nothing wired.
pub struct EndstopInput<PIN> {
    pin: Option<PIN>,
    active_high: bool,
}

impl<PIN, E> EndstopInput<PIN>
where
    PIN: InputPin<Error = E>,
{
    /// An endstop wired to `pin`, triggered at the given level.
    pub fn new(pin: PIN, active_high: bool) -> Self {
        Self {
            pin: Some(pin),
            active_high,
        }
    }

    /// No switch at this end of the axis.
    pub fn absent() -> Self {
        Self {
            pin: None,
            active_high: false,
        }
    }

    pub fn is_present(&self) -> bool {
        self.pin.is_some()
    }

    /// Whether the switch is at its active level. `None` when absent.
    pub fn triggered(&mut self) -> Result<Option<bool>, E> {
        match self.pin.as_mut() {
            None => Ok(None),
            Some(pin) => Ok(Some(pin.is_high()? == self.active_high)),
        }
    }
}

/// The (min, max) endstop pair of one axis.
pub struct AxisEndstops<PIN> {
    pub min: EndstopInput<PIN>,
    pub max: EndstopInput<PIN>,
}

impl<PIN, E> AxisEndstops<PIN>
where
    PIN: InputPin<Error = E>,
{
    pub fn new(min: EndstopInput<PIN>, max: EndstopInput<PIN>) -> Self {
        Self { min, max }
    }

    /// An axis with no switches at all.
    pub fn none() -> Self {
        Self {
            min: EndstopInput::absent(),
            max: EndstopInput::absent(),
        }
    }

    pub fn is_present(&self, end_idx: usize) -> bool {
        match end_idx {
            MIN_IDX => self.min.is_present(),
            MAX_IDX => self.max.is_present(),
            _ => false,
        }
    }

    /// Reads one end of the pair; `None` when nothing is wired there.
    pub fn triggered(&mut self, end_idx: usize) -> Result<Option<bool>, E> {
        match end_idx {
            MIN_IDX => self.min.triggered(),
            MAX_IDX => self.max.triggered(),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn active_high_switch() {
        let pin = PinMock::new(&[
            Transaction::get(State::High),
            Transaction::get(State::Low),
        ]);
        let mut es = EndstopInput::new(pin, true);
        assert_eq!(es.triggered().unwrap(), Some(true));
        assert_eq!(es.triggered().unwrap(), Some(false));
        es.pin.as_mut().unwrap().done();
    }

    #[test]
    fn active_low_switch() {
        let pin = PinMock::new(&[Transaction::get(State::Low)]);
        let mut es = EndstopInput::new(pin, false);
        assert_eq!(es.triggered().unwrap(), Some(true));
        es.pin.as_mut().unwrap().done();
    }

    #[test]
    fn absent_input_reads_none() {
        let mut es: EndstopInput<PinMock> = EndstopInput::absent();
        assert!(!es.is_present());
        assert_eq!(es.triggered().unwrap(), None);
    }

    #[test]
    fn axis_pair_routes_by_end() {
        let min_pin = PinMock::new(&[Transaction::get(State::High)]);
        let mut axis = AxisEndstops::new(EndstopInput::new(min_pin, true), EndstopInput::absent());
        assert!(axis.is_present(MIN_IDX));
        assert!(!axis.is_present(MAX_IDX));
        assert_eq!(axis.triggered(MIN_IDX).unwrap(), Some(true));
        assert_eq!(axis.triggered(MAX_IDX).unwrap(), None);
        axis.min.pin.as_mut().unwrap().done();
    }
}
