#![no_std]
#![no_main]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::wildcard_imports)]

use defmt::*;
use ds1631::{Address, Ds1631, Ds1631Thermometer, Polarity, Resolution, Temperature, Thermometer};
use stm32f0xx_hal::{
    delay::Delay,
    gpio::{
        gpiob::{PB6, PB7},
        Alternate, AF1,
    },
    i2c::{self, I2c},
    pac::I2C1,
};

use defmt_rtt as _;
use panic_probe as _;

const SENSOR_ADDR: Address = Address::DEFAULT;
const HIGH_THRESHOLD: Temperature = Temperature::const_from_int(28);
const LOW_THRESHOLD: Temperature = Temperature::const_from_int(26);
const RESOLUTION: Resolution = Resolution::Bits12;

type Bus = I2c<I2C1, PB6<Alternate<AF1>>, PB7<Alternate<AF1>>>;
type Error = ds1631::Error<i2c::Error>;

/// Puts the sensor into 12-bit one-shot mode with an active-high thermostat output
fn setup(sensor: &mut Ds1631, i2c: &mut Bus) -> Result<(), Error> {
    sensor.set_polarity(i2c, Polarity::ActiveHigh)?;
    sensor.write_th(i2c, HIGH_THRESHOLD)?;
    sensor.write_tl(i2c, LOW_THRESHOLD)?;

    info!(
        "TH: {=f32}, TL: {=f32}",
        sensor.read_th(i2c)?.to_num::<f32>(),
        sensor.read_tl(i2c)?.to_num::<f32>()
    );

    Ok(())
}

#[cfg_attr(feature = "sizing", inline(never))]
fn sample(thermometer: &mut Ds1631Thermometer<Bus, Delay>) -> Result<(), Error> {
    let temp = thermometer.read()?;
    info!("Temperature: {=f32}", temp.to_num::<f32>());

    let (i2c, sensor) = thermometer.parts_mut();
    let config = sensor.read_config(i2c)?;
    if config.high_flag() {
        warn!("Temperature has reached TH ({=f32})", HIGH_THRESHOLD.to_num::<f32>());
    }
    if config.low_flag() {
        warn!("Temperature has reached TL ({=f32})", LOW_THRESHOLD.to_num::<f32>());
    }

    Ok(())
}

#[rtic::app(device = stm32f0xx_hal::pac, dispatchers = [USART1, TIM14])]
mod app {
    use defmt::*;
    use ds1631::{Ds1631, Ds1631Thermometer};
    use rtic_monotonics::{
        stm32::{Tim2 as Mono, *},
        Monotonic,
    };
    use stm32f0xx_hal::{
        delay::Delay,
        gpio::{Output, Pin, PushPull},
        i2c::I2c,
        pac::IWDG,
        prelude::*,
        watchdog::Watchdog,
    };

    use crate::{Bus, SENSOR_ADDR};

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        thermometer: Ds1631Thermometer<Bus, Delay>,
    }

    #[init]
    fn init(mut cx: init::Context) -> (Shared, Local) {
        // Set system clock to 24 MHz
        let mut rcc = cx
            .device
            .RCC
            .configure()
            .hsi48()
            .sysclk(24.mhz())
            .pclk(24.mhz())
            .hclk(24.mhz())
            .freeze(&mut cx.device.FLASH);

        trace!("sysclk: {}", rcc.clocks.sysclk().0);
        trace!("hclk: {}", rcc.clocks.hclk().0);
        trace!("pclk: {}", rcc.clocks.pclk().0);

        // Enable tim2 monotonic
        let token = rtic_monotonics::create_stm32_tim2_monotonic_token!();
        Mono::start(24_000_000, token);

        // Setup systick delay
        let delay = Delay::new(cx.core.SYST, &rcc);

        // Setup GPIO
        let gpiob = cx.device.GPIOB.split(&mut rcc);
        let pb3 = gpiob.pb3.into_push_pull_output(&cx.cs);

        let _ = blinky::spawn(pb3.downgrade());
        let _ = watchdog::spawn(cx.device.IWDG);

        // Setup I2C1 on PB6 (SCL) & PB7 (SDA)
        let scl = gpiob.pb6.into_alternate_af1(&cx.cs);
        let sda = gpiob.pb7.into_alternate_af1(&cx.cs);
        let mut i2c = I2c::i2c1(cx.device.I2C1, (scl, sda), 100.khz(), &mut rcc);

        // Setup DS1631
        let mut sensor = Ds1631::new(SENSOR_ADDR);
        info!("DS1631 at {}", sensor.address());
        if let Err(e) = crate::setup(&mut sensor, &mut i2c) {
            error!("DS1631 setup failed: {=str}", e.as_str());
        }

        let mut thermometer = Ds1631Thermometer::new(i2c, sensor, delay);
        if let Err(e) = thermometer.init(crate::RESOLUTION) {
            error!("DS1631 init failed: {=str}", e.as_str());
        }

        let _ = sampler::spawn();

        (Shared {}, Local { thermometer })
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }

    #[task(priority = 2)]
    async fn blinky(_: blinky::Context, mut pin: Pin<Output<PushPull>>) {
        unwrap!(pin.set_low());
        let mut now = Mono::now();
        loop {
            unwrap!(pin.toggle());
            now += 500.millis();
            Mono::delay_until(now).await;
        }
    }

    #[task(priority = 2)]
    async fn watchdog(_: watchdog::Context, wdg: IWDG) {
        let mut wdg = Watchdog::new(wdg);
        wdg.start(1.hz());

        loop {
            wdg.feed();
            Mono::delay(100.millis()).await;
        }
    }

    /// Samples the temperature every 2 seconds.
    ///
    /// One-shot reads block on the bus & delay, so this runs below the heartbeat & watchdog.
    #[task(priority = 1, local = [thermometer])]
    async fn sampler(cx: sampler::Context) {
        let mut now = Mono::now();

        loop {
            if let Err(e) = crate::sample(cx.local.thermometer) {
                error!("Error: {=str}", e.as_str());
            }

            now += 2.secs();
            Mono::delay_until(now).await;
        }
    }

    timestamp!("{=u64:us}", {
        Mono::now().duration_since_epoch().to_micros()
    });
}
