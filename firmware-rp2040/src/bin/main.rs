#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::UART1;
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, BufferedUartRx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use embedded_io_async::BufRead;
use portable_atomic::{AtomicU32, Ordering};
use rc_receiver_rp2040::serial_rx::{LinkEvent, LinkMonitor, RcMessage};
use rc_receiver_rp2040::{receiver_config, uart_config, Receiver, PROTOCOL};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

/// Latest decoded message, from the RX task to consumers.
/// Signal gives "latest value wins": a slow consumer skips stale frames.
static MESSAGE_SIGNAL: StaticCell<Signal<CriticalSectionRawMutex, RcMessage>> = StaticCell::new();

/// UART ring buffers.
static TX_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();

/// Frames decoded since boot.
static FRAME_COUNT: AtomicU32 = AtomicU32::new(0);

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("RC receiver starting ({:?})...", PROTOCOL);

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let signal = MESSAGE_SIGNAL.init(Signal::new());

    // --- UART Setup ---
    let tx_buffer = TX_BUFFER.init([0; 64]);
    let rx_buffer = RX_BUFFER.init([0; 256]);
    let uart = BufferedUart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        tx_buffer,
        rx_buffer,
        uart_config(),
    );

    let (tx, rx) = uart.split();

    let mut receiver = Receiver::new();
    if let Err(e) = receiver.begin(receiver_config(tx)) {
        error!("Receiver setup failed: {:?}", e);
        return;
    }

    // On-board LED shows link state
    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(rx_task(rx, receiver, signal, led).unwrap());
    spawner.spawn(report_task(signal).unwrap());

    info!("RC receiver initialized, waiting for frames...");
}

/// RX task - feeds UART bytes to the receiver, publishes decoded messages
/// and tracks link loss.
#[embassy_executor::task]
async fn rx_task(
    mut uart: BufferedUartRx,
    mut receiver: Receiver,
    signal: &'static Signal<CriticalSectionRawMutex, RcMessage>,
    mut led: Output<'static>,
) {
    let mut monitor = LinkMonitor::new();
    // Wakes the loop on a silent line so idle gaps and timeouts are seen
    let mut ticker = Ticker::every(Duration::from_millis(1));

    loop {
        let event = select(uart.fill_buf(), ticker.next()).await;
        match event {
            Either::First(Ok(bytes)) => {
                let taken = match receiver.source_mut() {
                    Some(source) => source.push(bytes),
                    None => bytes.len(),
                };
                uart.consume(taken);
            }
            Either::First(Err(e)) => {
                // The read that reported this also re-armed reception
                warn!("UART error: {:?}", e);
            }
            Either::Second(()) => {}
        }

        receiver.update();

        let mut latest = None;
        while let Some(msg) = receiver.get_message() {
            monitor.record(&msg);
            latest = Some(msg);
            FRAME_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(msg) = latest {
            signal.signal(msg);
        }

        match monitor.poll(latest.is_some(), receiver.is_timed_out()) {
            Some(LinkEvent::Acquired) => {
                info!("Link acquired");
                led.set_high();
            }
            Some(LinkEvent::Lost) => {
                warn!(
                    "Link lost: no frame for {} ms",
                    receiver.time_since_last_message().as_millis()
                );
                led.set_low();
                // Hold the last channels, flagged so consumers go to safe outputs
                signal.signal(monitor.failsafe_message());
            }
            None => {}
        }
    }
}

/// Report task - logs the newest channels once per second.
#[embassy_executor::task]
async fn report_task(signal: &'static Signal<CriticalSectionRawMutex, RcMessage>) {
    let mut heartbeat = Ticker::every(Duration::from_secs(1));
    let mut latest: Option<RcMessage> = None;

    loop {
        match select(signal.wait(), heartbeat.next()).await {
            Either::First(msg) => {
                if msg.is_failsafe() {
                    warn!("Failsafe: {:?}", msg.channels);
                }
                latest = Some(msg);
            }
            Either::Second(()) => {
                let frames = FRAME_COUNT.load(Ordering::Relaxed);
                match latest {
                    Some(msg) => info!("{} frames, channels {:?}", frames, msg.channels),
                    None => info!("{} frames, no data yet", frames),
                }
            }
        }
    }
}
