//! Error types for supercell.
//!
//! Only setup-time operations can fail: building the domain decomposition,
//! filling particle storage, and acquiring a GPU. Per-particle evaluation has
//! no error path.

use std::fmt;

/// Errors in domain geometry or particle placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A global domain extent is zero or negative.
    EmptyGlobalDomain { axis: usize, size: i32 },
    /// The local domain does not fit inside the global domain.
    LocalDomainOutside { axis: usize, offset: i32, size: i32, global: i32 },
    /// A supercell extent is zero or negative.
    EmptySuperCell { axis: usize, super_cell: i32 },
    /// The local domain extent is not a multiple of the supercell size.
    NotSuperCellAligned { axis: usize, size: i32, super_cell: i32 },
    /// A cell lies outside the local domain.
    CellOutside { axis: usize, cell: i32, size: i32 },
    /// A rank grid is empty, or the rank is not inside it.
    InvalidRank { axis: usize, rank: i32, ranks: i32 },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::EmptyGlobalDomain { axis, size } => {
                write!(f, "Global domain extent along axis {} must be positive, got {}", axis, size)
            }
            DomainError::LocalDomainOutside { axis, offset, size, global } => write!(
                f,
                "Local domain [{}, {}) along axis {} exceeds the global extent {}",
                offset,
                offset + size,
                axis,
                global
            ),
            DomainError::EmptySuperCell { axis, super_cell } => {
                write!(f, "Supercell extent along axis {} must be positive, got {}", axis, super_cell)
            }
            DomainError::NotSuperCellAligned { axis, size, super_cell } => write!(
                f,
                "Local domain extent {} along axis {} is not a multiple of the supercell size {}",
                size, axis, super_cell
            ),
            DomainError::CellOutside { axis, cell, size } => write!(
                f,
                "Cell {} along axis {} is outside the local domain of extent {}",
                cell, axis, size
            ),
            DomainError::InvalidRank { axis, rank, ranks } => {
                write!(f, "Rank {} along axis {} is not inside a rank grid of {}", rank, axis, ranks)
            }
        }
    }
}

impl std::error::Error for DomainError {}

/// Errors that can occur during GPU evaluation.
#[derive(Debug)]
pub enum GpuError {
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// Failed to map buffer for reading.
    BufferMapping(String),
    /// The particle count needs more workgroups than one dispatch allows.
    DispatchTooLarge { particles: usize, max: usize },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::BufferMapping(msg) => write!(f, "Failed to map GPU buffer: {}", msg),
            GpuError::DispatchTooLarge { particles, max } => {
                write!(f, "{} particles exceed the single-dispatch limit of {}", particles, max)
            }
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

impl From<wgpu::BufferAsyncError> for GpuError {
    fn from(e: wgpu::BufferAsyncError) -> Self {
        GpuError::BufferMapping(e.to_string())
    }
}
