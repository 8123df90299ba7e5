//! Mockall-based `Peripheral` mock for loop-behavior tests.

use mockall::mock;

use pinsim_core::common::error::SimError;
use pinsim_core::design::PinSet;
use pinsim_core::periph::sdram::Sdram;
use pinsim_core::periph::video::Vga;
use pinsim_core::periph::{Peripheral, PinDrive};

mock! {
    pub Periph {}
    impl Peripheral for Periph {
        fn name(&self) -> &'static str;
        fn eval(&mut self, edge: u64, pins: &PinSet) -> Result<(), SimError>;
        fn drives(&self, out: &mut Vec<PinDrive>);
        fn as_sdram_mut<'a>(&'a mut self) -> Option<&'a mut Sdram>;
        fn as_video_mut<'a>(&'a mut self) -> Option<&'a mut Vga>;
    }
}
