use tonic_build::manual::{Builder, Method, Service};

// The calculator service is declared here instead of in a `.proto` file so the
// build does not depend on `protoc`. Messages live in `crate::pb` and are
// encoded with prost.
fn main() {
    let calculator = Service::builder()
        .name("Calculator")
        .package("calculator")
        .comment("Four interaction shapes over one service.")
        .method(
            Method::builder()
                .name("sum")
                .route_name("Sum")
                .comment("One request, one response.")
                .input_type("crate::pb::SumRequest")
                .output_type("crate::pb::SumResponse")
                .codec_path("tonic_prost::ProstCodec")
                .build(),
        )
        .method(
            Method::builder()
                .name("prime_number")
                .route_name("PrimeNumber")
                .comment("Every prime up to the requested limit, paced, in ascending order.")
                .input_type("crate::pb::PrimeRequest")
                .output_type("crate::pb::PrimeResponse")
                .codec_path("tonic_prost::ProstCodec")
                .server_streaming()
                .build(),
        )
        .method(
            Method::builder()
                .name("compute_average")
                .route_name("ComputeAverage")
                .comment("Floor of the mean of every value sent before the client half-closes.")
                .input_type("crate::pb::AverageRequest")
                .output_type("crate::pb::AverageResponse")
                .codec_path("tonic_prost::ProstCodec")
                .client_streaming()
                .build(),
        )
        .method(
            Method::builder()
                .name("find_max_number")
                .route_name("FindMaxNumber")
                .comment("One response per new running maximum.")
                .input_type("crate::pb::MaxRequest")
                .output_type("crate::pb::MaxResponse")
                .codec_path("tonic_prost::ProstCodec")
                .client_streaming()
                .server_streaming()
                .build(),
        )
        .build();

    Builder::new().compile(&[calculator]);
}
