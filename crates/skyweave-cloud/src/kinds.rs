//! Resource type tokens
//!
//! Component types are logical groupings registered by the builders; every
//! other token names a provider resource the apply engine knows how to create.

pub const API_GATEWAY_COMPONENT: &str = "skyweave:aws:ApiGateway";
pub const FUNCTION_COMPONENT: &str = "skyweave:aws:Function";
pub const BUCKET_COMPONENT: &str = "skyweave:aws:SecureBucket";
pub const DISTRIBUTION_COMPONENT: &str = "skyweave:aws:Distribution";

// API Gateway
pub const REST_API: &str = "aws:apigateway/RestApi";
pub const API_RESOURCE: &str = "aws:apigateway/Resource";
pub const METHOD: &str = "aws:apigateway/Method";
pub const INTEGRATION: &str = "aws:apigateway/Integration";
pub const AUTHORIZER: &str = "aws:apigateway/Authorizer";
pub const DEPLOYMENT: &str = "aws:apigateway/Deployment";
pub const STAGE: &str = "aws:apigateway/Stage";
pub const API_KEY: &str = "aws:apigateway/ApiKey";
pub const USAGE_PLAN: &str = "aws:apigateway/UsagePlan";
pub const USAGE_PLAN_KEY: &str = "aws:apigateway/UsagePlanKey";
pub const DOMAIN_NAME: &str = "aws:apigateway/DomainName";
pub const BASE_PATH_MAPPING: &str = "aws:apigateway/BasePathMapping";

// Lambda
pub const LAMBDA_FUNCTION: &str = "aws:lambda/Function";
pub const LAMBDA_PERMISSION: &str = "aws:lambda/Permission";
pub const LAMBDA_ALIAS: &str = "aws:lambda/Alias";

// IAM
pub const IAM_ROLE: &str = "aws:iam/Role";
pub const IAM_ROLE_POLICY_ATTACHMENT: &str = "aws:iam/RolePolicyAttachment";

// CloudWatch
pub const LOG_GROUP: &str = "aws:cloudwatch/LogGroup";
pub const METRIC_ALARM: &str = "aws:cloudwatch/MetricAlarm";

// Storage and delivery
pub const S3_BUCKET: &str = "aws:s3/Bucket";
pub const CLOUDFRONT_DISTRIBUTION: &str = "aws:cloudfront/Distribution";
