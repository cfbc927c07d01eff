//! Bidirectional data-line abstraction.
//!
//! The DS1302 shares one IO line for command, write and read phases, so the
//! driver needs to flip that line between push-pull output and (pulled-up)
//! input at exact points in the bit stream. `embedded-hal` 1.0 has no trait
//! for a runtime-switchable pin, so the driver defines its own small
//! capability and ships adapters for the RP-series SIO pins.

/// Direction of the shared IO line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Host drives the line (command byte, register writes).
    Output,
    /// Chip drives the line (register reads).
    Input,
}

/// A GPIO line that can be reconfigured between output and input at runtime.
///
/// `write` is only meaningful in [`Direction::Output`], `read` only in
/// [`Direction::Input`]; implementations may reconfigure on the fly when
/// called in the wrong direction, but the driver always switches explicitly
/// first.
pub trait IoPin {
    /// An error that might happen while toggling or reconfiguring the pin.
    type Error;

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    fn write(&mut self, high: bool) -> Result<(), Self::Error>;

    fn read(&mut self) -> Result<bool, Self::Error>;
}

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
mod sio {
    use super::{Direction, IoPin};

    use embedded_hal::digital::{InputPin, OutputPin};

    #[cfg(feature = "rp2350")]
    use rp235x_hal as hal;

    #[cfg(feature = "rp2040")]
    use rp2040_hal as hal;

    use hal::gpio::{
        FunctionSio, FunctionSioInput, FunctionSioOutput, Pin, PinId, PullDown, PullUp, SioInput,
        SioOutput, ValidFunction,
    };

    enum State<I>
    where
        I: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
    {
        Output(Pin<I, FunctionSioOutput, PullDown>),
        Input(Pin<I, FunctionSioInput, PullUp>),
    }

    /// Adapter driving one SIO pin as the DS1302 IO line.
    ///
    /// Direction changes reconfigure the pin between push-pull output and
    /// pull-up input; the pull-up keeps released-bus reads deterministic.
    pub struct SioIoPin<I>
    where
        I: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
    {
        state: Option<State<I>>,
    }

    impl<I> SioIoPin<I>
    where
        I: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
    {
        pub fn new(pin: Pin<I, FunctionSioOutput, PullDown>) -> Self {
            SioIoPin {
                state: Some(State::Output(pin)),
            }
        }

        /// Release the pin, back in output configuration.
        pub fn free(mut self) -> Pin<I, FunctionSioOutput, PullDown> {
            match self.state.take().unwrap() {
                State::Output(pin) => pin,
                State::Input(pin) => pin.reconfigure(),
            }
        }
    }

    impl<I> IoPin for SioIoPin<I>
    where
        I: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
    {
        type Error = core::convert::Infallible;

        fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
            // The typestate changes on reconfiguration, so the pin moves
            // through the Option.
            let state = match (self.state.take().unwrap(), direction) {
                (State::Output(pin), Direction::Input) => State::Input(pin.into_pull_up_input()),
                (State::Input(pin), Direction::Output) => State::Output(pin.reconfigure()),
                (state, _) => state,
            };
            self.state = Some(state);
            Ok(())
        }

        fn write(&mut self, high: bool) -> Result<(), Self::Error> {
            self.set_direction(Direction::Output)?;
            match self.state.as_mut().unwrap() {
                State::Output(pin) => pin.set_state(high.into()),
                State::Input(_) => unreachable!(),
            }
        }

        fn read(&mut self) -> Result<bool, Self::Error> {
            self.set_direction(Direction::Input)?;
            match self.state.as_mut().unwrap() {
                State::Input(pin) => pin.is_high(),
                State::Output(_) => unreachable!(),
            }
        }
    }
}

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
pub use sio::SioIoPin;
