//! Hardware register addressing: the two general register files, the accumulators, and
//! the handful of special-purpose peripheral registers.

/// Which physical register file a [`Register`] addresses.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum RegisterFile {
    A,
    B,
    Accumulator,
    Peripheral,
}

/// A `(file, index)` pair. Equality and hashing are structural, so two `Register` values
/// referring to the same physical register always compare equal regardless of how they
/// were constructed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Register {
    pub file: RegisterFile,
    pub index: u8,
}

impl Register {
    pub const fn new(file: RegisterFile, index: u8) -> Register {
        Register { file, index }
    }

    pub fn is_accumulator(&self) -> bool {
        self.file == RegisterFile::Accumulator
    }

    /// Lane index `0..=15` on read; writes have no effect.
    pub fn element_number() -> Register {
        Register::new(RegisterFile::Peripheral, 0)
    }

    /// The QPU's own index `0..=11` among the twelve processors on one slice group.
    pub fn qpu_number() -> Register {
        Register::new(RegisterFile::Peripheral, 1)
    }

    /// Written: broadcast the value to all 16 lanes, four at a time per quad. Read: yields
    /// the broadcast value of the reading lane's quad.
    pub fn replicate_all() -> Register {
        Register::new(RegisterFile::Peripheral, 2)
    }

    /// Writes to this register are discarded; reads always yield zero.
    pub fn nop_register() -> Register {
        Register::new(RegisterFile::Peripheral, 3)
    }

    /// One of the four SFU trigger-on-write input registers.
    pub fn sfu_input(function: SfuFunction) -> Register {
        Register::new(RegisterFile::Peripheral, 0x10 + function as u8)
    }

    /// The accumulator an SFU result is read back from, two cycles after the trigger write.
    pub fn sfu_output() -> Register {
        Register::new(RegisterFile::Accumulator, 4)
    }

    pub fn rotation_accumulator() -> Register {
        Register::new(RegisterFile::Accumulator, 5)
    }

    pub fn vpm_generic() -> Register {
        Register::new(RegisterFile::Peripheral, 0x20)
    }

    pub fn vpm_dma_read_setup() -> Register {
        Register::new(RegisterFile::Peripheral, 0x21)
    }

    pub fn vpm_dma_write_setup() -> Register {
        Register::new(RegisterFile::Peripheral, 0x22)
    }

    pub fn vpm_dma_wait() -> Register {
        Register::new(RegisterFile::Peripheral, 0x23)
    }

    pub fn tmu_address(unit: u8) -> Register {
        Register::new(RegisterFile::Peripheral, 0x30 + unit)
    }

    pub fn semaphore(id: u8) -> Register {
        assert!(id < 16, "semaphore id must be in [0, 15], got {}", id);
        Register::new(RegisterFile::Peripheral, 0x40 + id)
    }
}

/// The four special-function units.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SfuFunction {
    Reciprocal = 0,
    ReciprocalSqrt = 1,
    Exp2 = 2,
    Log2 = 3,
}
