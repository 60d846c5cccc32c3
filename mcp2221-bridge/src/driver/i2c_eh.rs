//! embedded_hal I2C trait implementations for MCP2221.
use embedded_hal::i2c::{self, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};

use super::MCP2221;
use crate::Error;
use crate::constants::MAX_I2C_TRANSFER_PLUS_1;
use crate::i2c::{ReadKind, WriteKind};
use crate::transport::Transport;

impl i2c::Error for Error {
    fn kind(&self) -> i2c::ErrorKind {
        // The MCP2221 only tells the address NACK apart from other engine faults,
        // and a stuck line is the only clear bus error.
        match self {
            Error::NotAcknowledged => i2c::ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Error::LowSclStuck | Error::LowSdaStuck => i2c::ErrorKind::Bus,
            _ => i2c::ErrorKind::Other,
        }
    }
}

impl<T: Transport> i2c::ErrorType for MCP2221<T> {
    type Error = Error;
}

/// Helper to chunk operations based on type (enum case).
fn same_operation_type(a: &Operation, b: &Operation) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Sum the lengths of a run of operations, checking the total is transferable.
fn total_length(ops: &[Operation<'_>]) -> Result<usize, Error> {
    let sum: usize = ops
        .iter()
        .map(|op| match op {
            Operation::Read(items) => items.len(),
            Operation::Write(items) => items.len(),
        })
        .sum();
    match sum {
        MAX_I2C_TRANSFER_PLUS_1.. => Err(Error::InvalidArgument(
            "I2C transaction must not exceed 65,535 bytes in each direction",
        )),
        0 => Err(Error::InvalidArgument("I2C transaction must not be empty")),
        sum => Ok(sum),
    }
}

type MaybeOps<'a, 'b, 'c> = Option<&'a mut &'b mut [Operation<'c>]>;
type WritesReads<'a, 'b, 'c> = (MaybeOps<'a, 'b, 'c>, MaybeOps<'a, 'b, 'c>);

fn try_get_valid_operations<'a, 'b, 'c>(
    ops: &'a mut [&'b mut [Operation<'c>]],
) -> Result<WritesReads<'a, 'b, 'c>, Error> {
    const READ_BEFORE_WRITE: Error =
        Error::InvalidArgument("the MCP2221 cannot read before writing in one transaction");
    match ops {
        // Three or more chunks implies read-before-write.
        [_, _, _, ..] => Err(READ_BEFORE_WRITE),
        [[Operation::Read(_), ..], [Operation::Write(_), ..]] => Err(READ_BEFORE_WRITE),
        // Write-Read
        [
            writes @ [Operation::Write(_), ..],
            reads @ [Operation::Read(_), ..],
        ] => Ok((Some(writes), Some(reads))),
        [reads @ [Operation::Read(_), ..]] => Ok((None, Some(reads))),
        [writes @ [Operation::Write(_), ..]] => Ok((Some(writes), None)),
        // No operations at all, or empty chunks (which chunk_by never produces).
        _ => Err(Error::InvalidArgument("I2C transaction must not be empty")),
    }
}

impl<T: Transport> I2c<SevenBitAddress> for MCP2221<T> {
    /// Execute the provided operations on the I2C bus.
    ///
    /// <div class="warning">
    ///
    /// The MCP2221 cannot fully support the contract of [`I2c::transaction`] because it
    /// does not have a HID command to perform an I2C read without issuing a final
    /// STOP condition.
    ///
    /// Transactions that place a read operation before a write will return
    /// [`Error::InvalidArgument`].
    ///
    /// </div>
    ///
    /// Adjacent operations of the same kind are coalesced, so all data to be
    /// written is copied into a single buffer and the whole read is buffered before
    /// being copied into the caller's read buffers. The other methods of the [`I2c`]
    /// trait avoid that overhead and should be preferred where possible.
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        // Because the MCP2221 needs to know transfer length up-front, and because it
        // doesn't support a read without a STOP condition, we need to coalesce the
        // passed operations and check they are possible.
        let mut chunked: Vec<&mut [Operation<'_>]> =
            operations.chunk_by_mut(same_operation_type).collect();
        let (writes, reads) = try_get_valid_operations(chunked.as_mut_slice())?;

        // Check both lengths before any bus activity.
        let write_length = writes.as_deref().map(|ops| total_length(ops)).transpose()?;
        let read_length = reads.as_deref().map(|ops| total_length(ops)).transpose()?;

        if let Some(writes) = writes {
            let mut write_data: Vec<u8> = Vec::with_capacity(write_length.unwrap_or(0));
            for op in writes.iter() {
                if let Operation::Write(buf) = op {
                    write_data.extend_from_slice(buf);
                }
            }
            // A following read continues with a repeated START instead of a STOP.
            let kind = match read_length {
                Some(_) => WriteKind::NoStop,
                None => WriteKind::Normal,
            };
            self.i2c_write_simple(address, &write_data, kind)?;
        }

        if let Some(reads) = reads {
            let mut our_buffer = vec![0u8; read_length.unwrap_or(0)];
            let kind = match write_length {
                Some(_) => ReadKind::RepeatedStart,
                None => ReadKind::Normal,
            };
            self.i2c_read_simple(address, &mut our_buffer, kind)?;

            // Fill the caller's buffers one at a time from our buffer.
            let mut copied_so_far = 0;
            for op in reads.iter_mut() {
                if let Operation::Read(their_buffer) = op {
                    let end = copied_so_far + their_buffer.len();
                    their_buffer.copy_from_slice(&our_buffer[copied_so_far..end]);
                    copied_so_far = end;
                }
            }
        }

        Ok(())
    }

    fn read(&mut self, address: SevenBitAddress, read: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c_read_simple(address, read, ReadKind::Normal)
    }

    fn write(&mut self, address: SevenBitAddress, write: &[u8]) -> Result<(), Self::Error> {
        self.i2c_write_simple(address, write, WriteKind::Normal)
    }

    fn write_read(
        &mut self,
        address: SevenBitAddress,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c_write_read(address, write, read)
    }
}

#[cfg(feature = "async")]
mod eh_async {
    use embedded_hal::i2c::{I2c as BlockingI2c, Operation};
    use embedded_hal_async::i2c::I2c as AsyncI2c;

    use crate::MCP2221;
    use crate::transport::Transport;

    /// The USB exchanges block; these complete before returning.
    impl<T: Transport> AsyncI2c for MCP2221<T> {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            BlockingI2c::transaction(self, address, operations)
        }

        async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
            BlockingI2c::read(self, address, read)
        }

        async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
            BlockingI2c::write(self, address, write)
        }

        async fn write_read(
            &mut self,
            address: u8,
            write: &[u8],
            read: &mut [u8],
        ) -> Result<(), Self::Error> {
            BlockingI2c::write_read(self, address, write, read)
        }
    }
}
