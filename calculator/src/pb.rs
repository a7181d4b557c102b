//! Wire messages for the `calculator.Calculator` service together with the
//! client and server stubs generated by `build.rs`.

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct SumRequest {
    #[prost(double, tag = "1")]
    pub num1: f64,
    #[prost(double, tag = "2")]
    pub num2: f64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct SumResponse {
    #[prost(double, tag = "1")]
    pub sum: f64,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct PrimeRequest {
    #[prost(int64, tag = "1")]
    pub limit: i64,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct PrimeResponse {
    #[prost(int64, tag = "1")]
    pub prime: i64,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct AverageRequest {
    #[prost(int64, tag = "1")]
    pub value: i64,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct AverageResponse {
    #[prost(int64, tag = "1")]
    pub average: i64,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct MaxRequest {
    #[prost(int64, tag = "1")]
    pub value: i64,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct MaxResponse {
    #[prost(int64, tag = "1")]
    pub max: i64,
}

include!(concat!(env!("OUT_DIR"), "/calculator.Calculator.rs"));
