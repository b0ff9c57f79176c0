use burn::{
    nn::{
        Relu,
        conv::{Conv2d, Conv2dConfig},
    },
    prelude::*,
};
use nn::PaddingConfig2d;

#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    activation: Relu,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.activation.forward(self.conv.forward(x))
    }
}

#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    input_channels: usize,
    num_filters: usize,
    #[config(default = "1")]
    stride: usize,
    #[config(default = "1")]
    dilation: usize,
}

impl ConvBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvBlock<B> {
        ConvBlock {
            conv: Conv2dConfig::new([self.input_channels, self.num_filters], [3, 3])
                .with_stride([self.stride, self.stride])
                .with_dilation([self.dilation, self.dilation])
                .with_padding(PaddingConfig2d::Explicit(self.dilation, self.dilation))
                .init(device),
            activation: Relu::new(),
        }
    }
}

/// Two dilated 3x3 convolutions with an identity (or 1x1-projected) skip.
#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    projection: Option<Conv2d<B>>,
    activation: Relu,
}

impl<B: Backend> ResidualBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let residual = match &self.projection {
            Some(projection) => projection.forward(x.clone()),
            None => x.clone(),
        };

        let x = self.conv1.forward(x);
        let x = self.activation.forward(x);
        let x = self.conv2.forward(x);

        self.activation.forward(x + residual)
    }
}

#[derive(Config, Debug)]
pub struct ResidualBlockConfig {
    input_channels: usize,
    num_filters: usize,
    #[config(default = "1")]
    dilation: usize,
}

impl ResidualBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResidualBlock<B> {
        let conv = |input, output| {
            Conv2dConfig::new([input, output], [3, 3])
                .with_dilation([self.dilation, self.dilation])
                .with_padding(PaddingConfig2d::Explicit(self.dilation, self.dilation))
                .init(device)
        };

        ResidualBlock {
            conv1: conv(self.input_channels, self.num_filters),
            conv2: conv(self.num_filters, self.num_filters),
            projection: (self.input_channels != self.num_filters).then(|| {
                Conv2dConfig::new([self.input_channels, self.num_filters], [1, 1]).init(device)
            }),
            activation: Relu::new(),
        }
    }
}
