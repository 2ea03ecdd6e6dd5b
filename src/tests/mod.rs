mod spi;
