use alloy::sol;

sol! {
    /// Clock auction shared by sale and breeding-rights markets.
    #[sol(rpc)]
    interface IClockAuction {
        event AuctionCreated(
            uint256 tokenId,
            address seller,
            uint256 startingPriceInToken,
            uint256 endingPriceInToken,
            uint256 duration,
            address token,
            uint256 startedAt
        );

        event AuctionCancelled(uint256 tokenId);

        event AuctionSuccessful(uint256 tokenId, uint256 totalPrice, address winner);

        event NewBid(
            uint256 indexed tokenId,
            address lastBidder,
            uint256 lastRecordPrice,
            address bidToken,
            uint256 bidMoment,
            uint256 returnToLastBidder
        );

        function getCurrentPriceInToken(uint256 tokenId) external view returns (uint256);
    }

    /// Work-lease markets additionally report the end of a lease.
    interface ILeaseAuction {
        event LeaseEnded(uint256 tokenId);
    }

    #[sol(rpc)]
    interface IERC721 {
        function ownerOf(uint256 tokenId) external view returns (address);
    }
}
