use actix_web::{HttpResponse, Responder, get, post, web};
use log::{error, info, warn};

use super::models::{
    AddBlockRequest, AddBlockResponse, AppState, ChainResponse, DifficultyResponse,
    ValidateResponse,
};
use crate::blockchain::{ChainError, NONCE_SPACE};

/// Mine a block carrying `data` on top of the current tip.
///
/// The chain lock is only held to take a candidate and to append the result;
/// the nonce search runs on the blocking pool with no lock held. If another
/// block lands first the candidate no longer extends the tip and the request
/// gets a 409.
#[post("/blocks/")]
pub async fn add_block(
    state: web::Data<AppState>,
    req: web::Json<AddBlockRequest>,
) -> impl Responder {
    let data = req.into_inner().data;
    if data.is_empty() {
        return HttpResponse::BadRequest().body("data required");
    }

    let (candidate, difficulty_bits) = {
        let bc = state.blockchain.lock().expect("mutex poisoned");
        (bc.candidate(data), bc.difficulty_bits())
    };
    let max_attempts = state.max_nonce_attempts.unwrap_or(NONCE_SPACE);

    let mined = web::block(move || candidate.mine_bounded(difficulty_bits, max_attempts)).await;

    let block = match mined {
        Ok(Ok(block)) => block,
        Ok(Err(e @ ChainError::NonceSpaceExhausted { .. })) => {
            warn!("API - {}", e);
            return HttpResponse::ServiceUnavailable().body(e.to_string());
        }
        Ok(Err(e)) => {
            error!("API - add block failed: {}", e);
            return HttpResponse::InternalServerError().body(e.to_string());
        }
        Err(e) => {
            error!("API - mining task failed: {}", e);
            return HttpResponse::InternalServerError().body("mining task failed");
        }
    };

    let mut bc = state.blockchain.lock().expect("mutex poisoned");
    let index = bc.len();
    match bc.append_premined_block(block) {
        Ok(block) => {
            let resp = AddBlockResponse::new(index, block);
            info!("API - added block #{} (hash={})", resp.index, resp.hash);
            HttpResponse::Ok().json(resp)
        }
        Err(e @ ChainError::BrokenLink { .. }) => {
            warn!("API - stale candidate: {}", e);
            HttpResponse::Conflict().body(e.to_string())
        }
        Err(e) => {
            error!("API - mined block rejected: {}", e);
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

/// Every block with its hashes in hex and its PoW status, oldest first.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ChainResponse {
        length: bc.len(),
        difficulty_bits: bc.difficulty_bits(),
        blocks: bc.summaries(),
    })
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ValidateResponse {
        valid: bc.is_valid_chain(),
        length: bc.len(),
        difficulty_bits: bc.difficulty_bits(),
    })
}

#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty_bits: bc.difficulty_bits(),
        target: bc.target().to_hex(),
    })
}
