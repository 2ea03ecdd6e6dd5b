use crate::can::Controller;
use crate::io::atmega162::{DDRB, PB4, PORTB, SPCR};
use crate::io::RegisterInterface;
use crate::mocks::{RegisterFile, TestClock};
use crate::spi::{ClockRateDivisor, SpiConfiguration, SpiMaster, SpiMode, TransportError};
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

#[test]
fn test_configuration_as_control_register() {
    assert_eq!(0b0101_1101, SpiConfiguration::default().as_control_register());

    assert_eq!(
        0b0101_0000,
        SpiConfiguration {
            mode: SpiMode::Mode0,
            clock_rate: ClockRateDivisor::DivideBy4,
            transfer_timeout: None,
        }
        .as_control_register()
    );

    assert_eq!(
        0b0101_0111,
        SpiConfiguration {
            mode: SpiMode::Mode1,
            clock_rate: ClockRateDivisor::DivideBy128,
            transfer_timeout: Some(10),
        }
        .as_control_register()
    );
}

#[test]
fn test_mode_from_register() {
    assert_eq!(SpiMode::Mode0, SpiMode::from_register(0b0101_0000));
    assert_eq!(SpiMode::Mode1, SpiMode::from_register(0b0101_0100));
    assert_eq!(SpiMode::Mode2, SpiMode::from_register(0b0101_1000));
    assert_eq!(SpiMode::Mode3, SpiMode::from_register(0b0101_1100));
}

#[test]
fn test_initialize() {
    let registers = RegisterFile::default();
    registers.write(DDRB, 0b0100_0001);

    let mut spi = SpiMaster::new(&registers, SpiConfiguration::default());
    spi.initialize();

    // SS, MOSI, SCK output, MISO input, other pins untouched
    assert_eq!(0b1011_0001, registers.value(DDRB));
    assert_eq!(vec![0x5D], registers.writes_to(SPCR));
    assert_eq!(SpiMode::Mode3, spi.read_mode());
}

#[test]
fn test_select_low_high() {
    let registers = RegisterFile::default();
    registers.write(PORTB, 0b0000_0011);

    let mut spi = SpiMaster::new(&registers, SpiConfiguration::default());

    spi.select_high();
    assert_eq!(0b0001_0011, registers.value(PORTB));

    spi.select_low();
    assert_eq!(0b0000_0011, registers.value(PORTB));
}

#[test]
fn test_exchange_waits_for_transfer_complete() {
    let registers = RegisterFile::default();
    registers.spi_delay.set(25);
    registers.spi_responses.borrow_mut().push(0x5A);

    let mut spi = SpiMaster::new(&registers, SpiConfiguration::default());

    assert_eq!(0x5A, spi.exchange(0xA0).unwrap());
    assert_eq!(vec![0xA0], *registers.spi_sent.borrow());
}

#[test]
fn test_exchange_timeout() {
    let registers = RegisterFile::default();
    registers.spi_stuck.set(true);

    let config = SpiConfiguration {
        transfer_timeout: Some(100),
        ..Default::default()
    };
    let mut spi = SpiMaster::new(&registers, config);

    assert_eq!(TransportError::Timeout, spi.exchange(0xA0).unwrap_err());
}

#[test]
fn test_exchange_bounded_wait_success() {
    let registers = RegisterFile::default();
    registers.spi_delay.set(3);
    registers.spi_responses.borrow_mut().push(0x11);

    let config = SpiConfiguration {
        transfer_timeout: Some(10),
        ..Default::default()
    };
    let mut spi = SpiMaster::new(&registers, config);

    assert_eq!(0x11, spi.exchange(0x00).unwrap());
}

#[test]
fn test_transfer_in_place() {
    let registers = RegisterFile::default();
    registers.spi_responses.borrow_mut().extend_from_slice(&[0x00, 0x00, 0x77]);

    let mut spi = SpiMaster::new(&registers, SpiConfiguration::default());

    let mut buffer = [0x03, 0x2A, 0x00];
    let response = spi.transfer(&mut buffer).unwrap();

    assert_eq!([0x00, 0x00, 0x77], response);
    assert_eq!(vec![0x03, 0x2A, 0x00], *registers.spi_sent.borrow());
}

#[test]
fn test_select_pin() {
    let registers = RegisterFile::default();
    let spi = SpiMaster::new(&registers, SpiConfiguration::default());

    let mut pin = spi.select_pin();

    pin.set_high().unwrap();
    assert_eq!(1 << PB4, registers.value(PORTB));

    pin.set_low().unwrap();
    assert_eq!(0, registers.value(PORTB));
}

#[test]
fn test_controller_over_host_transport() {
    let registers = RegisterFile::default();
    registers.write(PORTB, 1 << PB4);
    // Dummy byte of the read frame returns the register content
    registers.spi_responses.borrow_mut().extend_from_slice(&[0x00, 0x00, 0xAB]);

    let spi = SpiMaster::new(&registers, SpiConfiguration::default());
    let pin = spi.select_pin();

    let mut controller: Controller<_, _, TestClock> = Controller::new(spi, pin);

    assert_eq!(0xAB, controller.read(0x05).unwrap());
    assert_eq!(vec![0x03, 0x05, 0x00], *registers.spi_sent.borrow());

    // CS: initial high, low for the frame, high again
    assert_eq!(vec![1 << PB4, 0, 1 << PB4], registers.writes_to(PORTB));
}
