//! Bulk transfers to and from a Pinguino board.
use std::{collections::VecDeque, future::Future, time::Duration};

use log::{info, warn};
use nusb::{DeviceInfo, transfer::RequestBuffer};
use pinguino_protocol::{
    Architecture, CONFIGURATION, ENDPOINT_IN, ENDPOINT_OUT, INTERFACE, PACKET_SIZE, VENDOR_ID,
};
use tokio::time::{sleep, timeout};

use crate::error::Error;

/// A bidirectional bulk channel to a device.
///
/// A `None` limit waits for the transfer forever.
pub trait BulkLink {
    /// Read exactly `len` bytes.
    fn read(
        &mut self,
        len: usize,
        limit: Option<Duration>,
    ) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;

    /// Write `data`, returning how many bytes the device accepted.
    fn write(
        &mut self,
        data: &[u8],
        limit: Option<Duration>,
    ) -> impl Future<Output = Result<usize, Error>> + Send;
}

/// A board seen on the bus.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub info: DeviceInfo,
    pub arch: Architecture,
}

/// List attached Pinguino boards, optionally of one architecture only.
pub fn find_devices(arch: Option<Architecture>) -> Result<Vec<Candidate>, Error> {
    let candidates = nusb::list_devices()
        .map_err(|e| Error::Usb("listing devices", e))?
        .filter(|info| info.vendor_id() == VENDOR_ID)
        .filter_map(|info| {
            let found = Architecture::from_product_id(info.product_id())?;
            Some(Candidate { info, arch: found })
        })
        .filter(|candidate| arch.is_none_or(|wanted| wanted == candidate.arch))
        .collect();

    Ok(candidates)
}

/// Bytes of completed packets not yet handed out.
///
/// A packet may hold several records or only part of one.
#[derive(Debug, Default)]
pub struct PacketBuffer {
    pending: VecDeque<u8>,
}

impl PacketBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes waiting for the next read.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pull packets from `next_packet` until `len` bytes are buffered, then
    /// hand out exactly `len` of them.
    ///
    /// Packets completed before a cancelled read stay buffered.
    pub async fn fill<F, Fut>(&mut self, len: usize, mut next_packet: F) -> Result<Vec<u8>, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<u8>, Error>>,
    {
        while self.pending.len() < len {
            let packet = next_packet().await?;
            self.pending.extend(packet);
        }
        Ok(self.pending.drain(..len).collect())
    }
}

/// An opened board with its interface claimed.
pub struct Pinguino {
    interface: nusb::Interface,
    arch: Architecture,
    buffer: PacketBuffer,
}

impl Pinguino {
    /// Open the first attached board.
    ///
    /// With `wait`, poll the bus once a second until a board shows up.
    pub async fn acquire(arch: Option<Architecture>, wait: bool) -> Result<Self, Error> {
        let mut first_attempt = true;

        loop {
            let mut candidates = find_devices(arch)?;

            if candidates.is_empty() {
                if !wait {
                    return Err(Error::NotFound);
                }
                if first_attempt {
                    info!("No Pinguino detected, waiting for a board to be connected");
                    first_attempt = false;
                }
                sleep(Duration::from_secs(1)).await;
                continue;
            }

            if candidates.len() > 1 {
                warn!(
                    "{} Pinguino boards detected, using the one at bus {} address {}",
                    candidates.len(),
                    candidates[0].info.bus_number(),
                    candidates[0].info.device_address()
                );
            }

            return Self::open(&candidates.swap_remove(0));
        }
    }

    /// Open a board and claim its data interface.
    pub fn open(candidate: &Candidate) -> Result<Self, Error> {
        let device = candidate
            .info
            .open()
            .map_err(|e| Error::Usb("opening the device", e))?;

        // Boards come up in their only configuration already.
        if let Err(e) = device.set_configuration(CONFIGURATION) {
            warn!("Could not select configuration {}: {}", CONFIGURATION, e);
        }

        let interface = device
            .detach_and_claim_interface(INTERFACE)
            .map_err(|e| Error::Usb("claiming the interface", e))?;

        info!(
            "Pinguino found ({} board at bus {} address {})",
            candidate.arch,
            candidate.info.bus_number(),
            candidate.info.device_address()
        );

        Ok(Self {
            interface,
            arch: candidate.arch,
            buffer: PacketBuffer::new(),
        })
    }

    /// Board family.
    pub fn architecture(&self) -> Architecture {
        self.arch
    }

    /// Release the interface.
    pub fn close(self) {
        info!("Releasing {} Pinguino", self.arch);
    }
}

impl BulkLink for Pinguino {
    async fn read(&mut self, len: usize, limit: Option<Duration>) -> Result<Vec<u8>, Error> {
        let interface = &self.interface;
        let next_packet = || async move {
            interface
                .bulk_in(ENDPOINT_IN, RequestBuffer::new(PACKET_SIZE))
                .await
                .into_result()
                .map_err(|e| Error::Transfer("reading", e))
        };

        with_limit(limit, self.buffer.fill(len, next_packet)).await
    }

    async fn write(&mut self, data: &[u8], limit: Option<Duration>) -> Result<usize, Error> {
        let transfer = async {
            let completion = self.interface.bulk_out(ENDPOINT_OUT, data.to_vec()).await;
            let response = completion
                .into_result()
                .map_err(|e| Error::Transfer("writing", e))?;
            Ok::<_, Error>(response.actual_length())
        };

        with_limit(limit, transfer).await
    }
}

async fn with_limit<T>(
    limit: Option<Duration>,
    transfer: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    match limit {
        Some(limit) => timeout(limit, transfer).await.map_err(|_| Error::Timeout)?,
        None => transfer.await,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out `packets` in order, then never completes.
    fn packets(
        packets: impl IntoIterator<Item = Vec<u8>>,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = Result<Vec<u8>, Error>> + Send>>
    {
        let mut packets: VecDeque<Vec<u8>> = packets.into_iter().collect();
        move || {
            let next = packets.pop_front();
            Box::pin(async move {
                match next {
                    Some(packet) => Ok(packet),
                    None => std::future::pending().await,
                }
            })
        }
    }

    #[tokio::test]
    async fn test_packet_with_several_records() {
        let mut packet = b"START".to_vec();
        packet.extend(1..=8);
        let mut source = packets([packet]);
        let mut buffer = PacketBuffer::new();

        assert_eq!(buffer.fill(5, &mut source).await.unwrap(), b"START");
        assert_eq!(buffer.len(), 8);
        assert_eq!(
            buffer.fill(8, &mut source).await.unwrap(),
            vec![1, 2, 3, 4, 5, 6, 7, 8]
        );
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_record_split_across_packets() {
        let mut source = packets([vec![0x0E, 0x01], vec![0x9C, 0xFF, 0x2A]]);
        let mut buffer = PacketBuffer::new();

        assert_eq!(
            buffer.fill(4, &mut source).await.unwrap(),
            vec![0x0E, 0x01, 0x9C, 0xFF]
        );
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_keeps_partial_record() {
        let mut buffer = PacketBuffer::new();

        let result = with_limit(
            Some(Duration::from_millis(10)),
            buffer.fill(8, packets([vec![1, 2, 3]])),
        )
        .await;
        assert!(matches!(result, Err(Error::Timeout)));
        assert_eq!(buffer.len(), 3);

        let record = with_limit(
            Some(Duration::from_millis(10)),
            buffer.fill(8, packets([vec![4, 5, 6, 7, 8, 9]])),
        )
        .await
        .unwrap();
        assert_eq!(record, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_packet_error_propagates() {
        let mut buffer = PacketBuffer::new();
        let result = buffer
            .fill(4, || async { Err(Error::Timeout) })
            .await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn test_limit_expires() {
        let never = std::future::pending::<Result<(), Error>>();
        let result = with_limit(Some(Duration::from_millis(10)), never).await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn test_no_limit_passes_through() {
        let result = with_limit(None, async { Ok::<_, Error>(5) }).await;
        assert_eq!(result.unwrap(), 5);
    }
}
