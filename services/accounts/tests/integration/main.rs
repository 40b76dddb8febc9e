mod helpers;

mod account_test;
mod grpc_test;
mod phone_number_test;
