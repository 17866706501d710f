#![no_main]
#![no_std]

use boundary_primitives::{mul2, reverse_string};
use core::fmt::Write;
use cortex_m_rt::entry;
use panic_halt as _;

// USART1 data register on STM32F103
const UART_TX: *mut u8 = 0x4001_3804 as *mut u8;

struct Uart;

impl Write for Uart {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for byte in s.bytes() {
            unsafe {
                core::ptr::write_volatile(UART_TX, byte);
            }
        }
        Ok(())
    }
}

#[entry]
fn main() -> ! {
    let mut uart = Uart;

    let num = mul2(1000);
    let _ = write!(uart, "number: {}\r\n", num);

    // char word[8] = "abcd";
    let mut word = [b'a', b'b', b'c', b'd', 0, 0, 0, 0];
    reverse_string(&mut word, 4);
    if let Ok(text) = core::str::from_utf8(&word[..4]) {
        let _ = write!(uart, "buffer: {}\r\n", text);
    }

    loop {
        cortex_m::asm::nop();
    }
}
