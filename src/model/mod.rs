mod blocks;
mod dilated;

pub use blocks::{ConvBlock, ConvBlockConfig, ResidualBlock, ResidualBlockConfig};
pub use dilated::{DilatedNet, DilatedNetConfig};
