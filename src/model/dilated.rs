use burn::{
    nn::pool::{MaxPool2d, MaxPool2dConfig},
    nn::conv::{Conv2d, Conv2dConfig},
    prelude::*,
};

use super::blocks::{ConvBlock, ConvBlockConfig, ResidualBlock, ResidualBlockConfig};

/// Dilated fully-convolutional segmentation backbone.
///
/// A strided stem and one pooling stage bring the input down to 1/4
/// resolution; from there residual blocks grow the receptive field through
/// dilation instead of further downsampling, and a 1x1 classifier emits
/// per-pixel logits. The caller upsamples those back to input resolution.
#[derive(Module, Debug)]
pub struct DilatedNet<B: Backend> {
    stem: ConvBlock<B>,
    pool: MaxPool2d,
    res1: ResidualBlock<B>,
    res2: ResidualBlock<B>,
    res3: ResidualBlock<B>,
    classifier: Conv2d<B>,
    num_classes: usize,
}

#[derive(Config, Debug)]
pub struct DilatedNetConfig {
    #[config(default = "19")]
    num_classes: usize,
    #[config(default = "64")]
    base_channels: usize,
}

impl DilatedNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DilatedNet<B> {
        DilatedNet {
            stem: ConvBlockConfig::new(3, self.base_channels)
                .with_stride(2)
                .init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            res1: ResidualBlockConfig::new(self.base_channels, self.base_channels * 2)
                .init(device),
            res2: ResidualBlockConfig::new(self.base_channels * 2, self.base_channels * 4)
                .with_dilation(2)
                .init(device),
            res3: ResidualBlockConfig::new(self.base_channels * 4, self.base_channels * 4)
                .with_dilation(4)
                .init(device),
            classifier: Conv2dConfig::new([self.base_channels * 4, self.num_classes], [1, 1])
                .init(device),
            num_classes: self.num_classes,
        }
    }
}

impl<B: Backend> DilatedNet<B> {
    /// Maps `[batch, 3, h, w]` images to `[batch, num_classes, h/4, w/4]`
    /// logits.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.stem.forward(images);
        let x = self.pool.forward(x);
        let x = self.res1.forward(x);
        let x = self.res2.forward(x);
        let x = self.res3.forward(x);

        self.classifier.forward(x)
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use super::*;

    type B = NdArray<f32>;

    #[test]
    fn forward_emits_quarter_resolution_logits() {
        let device = Default::default();
        let model = DilatedNetConfig::new()
            .with_num_classes(5)
            .with_base_channels(8)
            .init::<B>(&device);

        let images = Tensor::<B, 4>::zeros([1, 3, 16, 24], &device);
        let logits = model.forward(images);

        assert_eq!(logits.dims(), [1, 5, 4, 6]);
    }
}
