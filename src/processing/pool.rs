//! Top-level block allocation from the IPAM pool with compensating rollback.

use crate::aws::IpamClient;
use crate::error::Result;
use crate::models::AllocationRecord;

/// Allocate one block per entry of `prefix_lengths`, in order.
///
/// If any request fails, every block obtained by this call is released again
/// before the original error is returned.
pub fn allocate<C: IpamClient + ?Sized>(
    client: &mut C,
    pool_id: &str,
    prefix_lengths: &[u8],
    description: Option<&str>,
) -> Result<Vec<AllocationRecord>> {
    log::info!(
        "#Start allocate() {} block(s) {:?} from {pool_id}",
        prefix_lengths.len(),
        prefix_lengths
    );
    let mut records = Vec::with_capacity(prefix_lengths.len());

    for &length in prefix_lengths {
        match client.allocate_cidr(pool_id, length, description) {
            Ok(record) => records.push(record),
            Err(e) => {
                log::error!("Allocation of /{length} from {pool_id} failed: {e}");
                rollback(client, pool_id, &records);
                return Err(e);
            }
        }
    }

    Ok(records)
}

/// Best-effort release used while unwinding a failed invocation.
///
/// Every record is attempted; release failures are logged and dropped so the
/// error that triggered the rollback stays the one reported.
pub fn rollback<C: IpamClient + ?Sized>(
    client: &mut C,
    pool_id: &str,
    records: &[AllocationRecord],
) {
    if records.is_empty() {
        return;
    }
    log::warn!("Rolling back {} allocation(s) in {pool_id}", records.len());
    for record in records {
        if let Err(e) = client.release_allocation(pool_id, record) {
            log::warn!("Rollback could not release {record}: {e}");
        }
    }
}

/// Release previously obtained blocks.
///
/// All records are attempted. The first failure is returned once the rest
/// have been tried.
pub fn release<C: IpamClient + ?Sized>(
    client: &mut C,
    pool_id: &str,
    records: &[AllocationRecord],
) -> Result<()> {
    log::info!("#Start release() {} block(s) from {pool_id}", records.len());
    let mut first_error = None;

    for record in records {
        if let Err(e) = client.release_allocation(pool_id, record) {
            log::error!("Release of {record} failed: {e}");
            if first_error.is_none() {
                first_error = Some(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
