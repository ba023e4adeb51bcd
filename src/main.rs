#![deny(unsafe_code)]
#![no_main]
#![no_std]

use panic_rtt_target as _panic_handler;

/// peripheral glue the logger drives
mod drivers;
/// submodule holding task handlers
mod tasks;

/*
 The RTIC application: device PAC, its peripherals on the init context,
 and SPI2/SPI3 donated as dispatchers for the `write_telemetry` software task.
*/
#[rtic::app(
    device = stm32f4xx_hal::pac,
    peripherals = true,
    dispatchers=[SPI2, SPI3],
)]
mod app {
    use cortex_m::singleton;
    use dwt_systick_monotonic::DwtSystick;
    use rtic::time::duration::Milliseconds;
    use rtt_target::{rprintln, rtt_init_print};
    use stm32f4xx_hal::{
        gpio::{gpioc::PC6, Alternate},
        pac::TIM8,
        prelude::*,
        pwm_input::PwmInput,
        rcc::Clocks,
        serial,
        timer::Timer,
    };
    use telemetry_logger::{
        config::{LOGGER_BAUDRATE, LOG_BUFFER_LEN},
        DoubleBuffer, LogBuffer, LoggerConfig, RcChannels, TelemetryLogger,
    };

    use crate::drivers::{DwtClock, Usart1DmaTx};

    const SYSCLK_FREQ: u32 = 48_000_000;
    #[monotonic(binds = SysTick, default = true)]
    type SysMono = DwtSystick<SYSCLK_FREQ>;

    /// RC PWM capture type
    pub(crate) type PwmMonitor = PwmInput<TIM8, PC6<Alternate<3>>>;
    /// the telemetry log, writing to USART1 through DMA2 stream 7
    pub(crate) type Logger = TelemetryLogger<Usart1DmaTx, DwtClock>;

    /// interval between two telemetry cycles
    pub(crate) const TELEMETRY_PERIOD: Milliseconds<u32> = Milliseconds(20u32);

    /* resources shared across RTIC tasks */
    #[shared]
    struct Shared {
        /// latest receiver channels, written by the capture interrupt
        rc_channels: RcChannels,
    }

    /* resources local to specific RTIC tasks */
    #[local]
    struct Local {
        monitor: PwmMonitor,
        capture_clock: DwtClock,
        clocks: Clocks,
        logger: Logger,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local, init::Monotonics) {
        // enable the dma2 master, USART1_TX is on DMA2 stream 7 channel 4
        ctx.device.RCC.ahb1enr.modify(|_, w| w.dma2en().enabled());
        // enable the debugger.
        ctx.device.DBGMCU.cr.modify(|_, w| {
            w.dbg_sleep().set_bit();
            w.dbg_standby().set_bit();
            w.dbg_stop().set_bit()
        });

        // Enable RTT logging
        rtt_init_print!();
        rprintln!("telemetry logger starting");
        let rcc = ctx.device.RCC.constrain();
        let clocks = rcc.cfgr.sysclk(SYSCLK_FREQ.hz()).freeze();

        /* start RTIC monotonics */
        // DwtSystick also turns on the DWT cycle counter the log clock reads.
        let mut dcb = ctx.core.DCB;
        let dwt = ctx.core.DWT;
        let systick = ctx.core.SYST;
        let mono = DwtSystick::new(&mut dcb, dwt, systick, clocks.sysclk().0);
        /* end RTIC monotonics */

        let gpioa = ctx.device.GPIOA.split();
        let gpioc = ctx.device.GPIOC.split();

        // TIM8 in PWM input mode measures one receiver channel on PC6.
        // CC interrupts fire once per captured pulse.
        let tim8_cc1 = gpioc.pc6.into_alternate();
        let monitor = Timer::new(ctx.device.TIM8, &clocks).pwm_input(50.hz(), tim8_cc1);

        // configure USART1 TX, the log line.
        let usart1_tx = gpioa.pa9.into_alternate();
        let usart1_config = serial::config::Config {
            baudrate: LOGGER_BAUDRATE.bps(),
            wordlength: serial::config::WordLength::DataBits8,
            parity: serial::config::Parity::ParityNone,
            stopbits: serial::config::StopBits::STOP1,
            dma: serial::config::DmaConfig::Tx,
        };
        let usart1 = serial::Serial::tx(ctx.device.USART1, usart1_tx, usart1_config, clocks)
            .expect("failed to configure USART1.");
        let transmitter = Usart1DmaTx::new(usart1, ctx.device.DMA2);

        // the log buffers must outlive any DMA transfer reading them
        let first: &'static mut LogBuffer =
            singleton!(: LogBuffer = [0; LOG_BUFFER_LEN]).expect("log buffer already taken");
        let second: &'static mut LogBuffer =
            singleton!(: LogBuffer = [0; LOG_BUFFER_LEN]).expect("log buffer already taken");
        let logger = TelemetryLogger::with_config(
            DoubleBuffer::new(first, second),
            transmitter,
            DwtClock::new(clocks.sysclk().0),
            LoggerConfig::default(),
        );

        // kick off the periodic task.
        write_telemetry::spawn_after(TELEMETRY_PERIOD).expect("failed to kick off telemetry task.");
        (
            Shared {
                rc_channels: RcChannels::new(),
            },
            Local {
                monitor,
                capture_clock: DwtClock::new(clocks.sysclk().0),
                clocks,
                logger,
            },
            init::Monotonics(mono),
        )
    }

    /* bring externed tasks into scope */
    use crate::tasks::{tim8_cc, write_telemetry};

    // RTIC docs specify we can modularize the code by using these `extern` blocks.
    // This allows us to specify the tasks in other modules and still work within
    // RTIC's infrastructure.
    extern "Rust" {
        // RC pulse capture
        #[task(
            binds=TIM8_CC,
            local=[monitor, capture_clock, clocks],
            shared=[rc_channels])]
        fn tim8_cc(context: tim8_cc::Context);

        // periodic telemetry frame composition
        #[task(local=[logger, cycle: u32 = 0], shared=[rc_channels])]
        fn write_telemetry(context: write_telemetry::Context);
    }
}
